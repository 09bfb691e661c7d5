//! The `Parser` contract and its convenience adapters.

use std::sync::Arc;

use crate::combinators::{
    Capture, CaptureOnly, Map, Optional, Remaining, Tag, ValidOrMissing,
};
use crate::result::ParseResult;

/// A parser over a slice of whitespace-separated tokens.
///
/// Parsers are immutable values: parsing the same input twice yields the same
/// result. The only exception is [`Delayed`](crate::Delayed), which builds its
/// inner parser from live state on every call.
pub trait Parser {
    type Output;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output>;

    /// Transform the parsed value, see [`Map`].
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U,
    {
        Map::new(self, f)
    }

    /// Never fail, see [`Optional`].
    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional::new(self)
    }

    /// Accept missing input but reject invalid input, see [`ValidOrMissing`].
    fn valid_or_missing(self) -> ValidOrMissing<Self>
    where
        Self: Sized,
    {
        ValidOrMissing::new(self)
    }

    /// Require the whole input to be consumed, see [`Remaining`].
    fn remaining(self) -> Remaining<Self>
    where
        Self: Sized,
    {
        Remaining::new(self)
    }

    /// Pair the value with a label, see [`Tag`].
    fn tag<L: Clone>(self, label: L) -> Tag<L, Self>
    where
        Self: Sized,
    {
        Tag::new(label, self)
    }

    /// Also return the consumed tokens, see [`Capture`].
    fn capture(self) -> Capture<Self>
    where
        Self: Sized,
    {
        Capture::new(self)
    }

    /// Return only the consumed tokens, see [`CaptureOnly`].
    fn capture_only(self) -> CaptureOnly<Self>
    where
        Self: Sized,
    {
        CaptureOnly::new(self)
    }

    /// Erase the concrete type so that differently built parsers with the
    /// same output can share a list.
    fn boxed(self) -> BoxedParser<Self::Output>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Box::new(self)
    }
}

/// A type-erased, shareable parser.
pub type BoxedParser<T> = Box<dyn Parser<Output = T> + Send + Sync>;

impl<P: Parser + ?Sized> Parser for Box<P> {
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        (**self).parse(args)
    }
}

impl<P: Parser + ?Sized> Parser for Arc<P> {
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        (**self).parse(args)
    }
}

impl<P: Parser + ?Sized> Parser for &P {
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        (**self).parse(args)
    }
}
