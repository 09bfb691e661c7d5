//! Parsers built from other parsers.
//!
//! Failures are threaded through as values. Combinators that hand a sub-parser
//! a tail of their input shift the failure's `consumed` back into their own
//! coordinates, so a top-level failure always points into the original token
//! list.

use std::collections::HashMap;
use std::hash::Hash;

use crate::adjacent::Adjacent;
use crate::parser::{BoxedParser, Parser};
use crate::result::{ParseFail, ParseResult, Parsed};

/// Transforms a successful value; failures pass through unchanged.
#[derive(Debug, Clone)]
pub struct Map<P, F> {
    parser: P,
    f: F,
}

impl<P, F> Map<P, F> {
    pub fn new(parser: P, f: F) -> Self {
        Self { parser, f }
    }
}

impl<P, F, U> Parser for Map<P, F>
where
    P: Parser,
    F: Fn(P::Output) -> U,
{
    type Output = U;

    fn parse(&self, args: &[&str]) -> ParseResult<U> {
        self.parser.parse(args).map(|parsed| parsed.map(&self.f))
    }
}

/// Never fails: a failed sub-parse becomes `None` consuming nothing.
#[derive(Debug, Clone)]
pub struct Optional<P> {
    parser: P,
}

impl<P> Optional<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for Optional<P> {
    type Output = Option<P::Output>;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        match self.parser.parse(args) {
            Ok(parsed) => Ok(parsed.map(Some)),
            Err(_) => Ok(Parsed::new(None, 0)),
        }
    }
}

/// `None` when the input is empty, otherwise the sub-parser's result.
///
/// Unlike [`Optional`], a present but invalid value is still an error.
#[derive(Debug, Clone)]
pub struct ValidOrMissing<P> {
    parser: P,
}

impl<P> ValidOrMissing<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for ValidOrMissing<P> {
    type Output = Option<P::Output>;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        if args.is_empty() {
            return Ok(Parsed::new(None, 0));
        }
        self.parser.parse(args).map(|parsed| parsed.map(Some))
    }
}

/// Runs parsers one after another, each on what the previous ones left.
pub struct Seq<T> {
    parsers: Vec<BoxedParser<T>>,
}

impl<T> Seq<T> {
    /// # Panics
    ///
    /// If `parsers` is empty.
    pub fn new(parsers: Vec<BoxedParser<T>>) -> Self {
        assert!(!parsers.is_empty(), "Seq: expected at least one parser");
        Self { parsers }
    }
}

impl<T> Parser for Seq<T> {
    type Output = Vec<T>;

    fn parse(&self, args: &[&str]) -> ParseResult<Vec<T>> {
        let mut values = Vec::with_capacity(self.parsers.len());
        let mut consumed = 0;
        for (index, parser) in self.parsers.iter().enumerate() {
            let parsed = parser.parse(&args[consumed..]).map_err(|fail| {
                fail.context(format!("while parsing argument {}", index + 1))
                    .offset(consumed)
            })?;
            values.push(parsed.value);
            consumed += parsed.consumed;
        }
        Ok(Parsed::new(values, consumed))
    }
}

/// The first of several alternatives that succeeds.
pub struct OneOf<T> {
    parsers: Vec<BoxedParser<T>>,
}

impl<T> OneOf<T> {
    pub fn new(parsers: Vec<BoxedParser<T>>) -> Self {
        Self { parsers }
    }
}

impl<T> Parser for OneOf<T> {
    type Output = T;

    fn parse(&self, args: &[&str]) -> ParseResult<T> {
        if args.is_empty() {
            return Err(ParseFail::no_argument());
        }
        self.parsers
            .iter()
            .find_map(|parser| parser.parse(args).ok())
            .ok_or_else(|| ParseFail::new("Invalid value", 0))
    }
}

/// Any subset of the given parsers, in any order, each at most once.
///
/// Passes are made over the parsers that have not matched yet, each tried
/// against the current head of the input, until a whole pass matches nothing.
/// A parser that matched is retired, so a repeated token shape cannot match it
/// again. The value lists results in declaration order, `None` for parsers
/// that never matched. Never fails.
pub struct SomeOf<T> {
    parsers: Vec<BoxedParser<T>>,
}

impl<T> SomeOf<T> {
    /// # Panics
    ///
    /// If `parsers` is empty.
    pub fn new(parsers: Vec<BoxedParser<T>>) -> Self {
        assert!(!parsers.is_empty(), "SomeOf: expected at least one parser");
        Self { parsers }
    }
}

impl<T> Parser for SomeOf<T> {
    type Output = Vec<Option<T>>;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        let mut values: Vec<Option<T>> = self.parsers.iter().map(|_| None).collect();
        let mut active: Vec<usize> = (0..self.parsers.len()).collect();
        let mut consumed = 0;
        loop {
            let mut retired = Vec::new();
            for &index in &active {
                if let Ok(parsed) = self.parsers[index].parse(&args[consumed..]) {
                    values[index] = Some(parsed.value);
                    consumed += parsed.consumed;
                    retired.push(index);
                }
            }
            if retired.is_empty() {
                break;
            }
            active.retain(|index| !retired.contains(index));
        }
        Ok(Parsed::new(values, consumed))
    }
}

/// A literal keyword followed by a value; only the value is kept.
#[derive(Debug, Clone)]
pub struct Keyword<P> {
    keyword: String,
    parser: P,
}

impl<P> Keyword<P> {
    pub fn new(keyword: impl Into<String>, parser: P) -> Self {
        Self {
            keyword: keyword.into(),
            parser,
        }
    }
}

impl<P: Parser> Parser for Keyword<P> {
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<P::Output> {
        let Some(first) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        if !first.eq_ignore_ascii_case(&self.keyword) {
            return Err(ParseFail::new(format!("Expected {}", self.keyword), 0));
        }
        match self.parser.parse(&args[1..]) {
            Ok(parsed) => Ok(Parsed::new(parsed.value, 1 + parsed.consumed)),
            Err(fail) => Err(fail.context(format!("after {}", self.keyword)).offset(1)),
        }
    }
}

/// [`Adjacent`] that keeps only the right-hand value.
pub struct IfThen<L, R> {
    parser: Adjacent<L, R>,
}

impl<L, R> IfThen<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            parser: Adjacent::new(left, right),
        }
    }
}

impl<L: Parser, R: Parser> Parser for IfThen<L, R> {
    type Output = R::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<R::Output> {
        self.parser
            .parse(args)
            .map(|parsed| parsed.map(|(_, right)| right))
    }
}

/// Requires the sub-parser to consume the entire input.
#[derive(Debug, Clone)]
pub struct Remaining<P> {
    parser: P,
}

impl<P> Remaining<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for Remaining<P> {
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<P::Output> {
        let parsed = self.parser.parse(args)?;
        if parsed.consumed == args.len() {
            Ok(parsed)
        } else {
            Err(ParseFail::new(
                "Extraneous input after command",
                parsed.consumed,
            ))
        }
    }
}

/// Builds the actual parser at parse time.
///
/// For grammars whose valid words come from live state, e.g. the ids of the
/// timers that exist right now. The factory runs on every `parse` call and its
/// result is not cached.
pub struct Delayed<F> {
    factory: F,
}

impl<F> Delayed<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, P> Parser for Delayed<F>
where
    F: Fn() -> P,
    P: Parser,
{
    type Output = P::Output;

    fn parse(&self, args: &[&str]) -> ParseResult<P::Output> {
        (self.factory)().parse(args)
    }
}

/// Pairs the value with a fixed label.
#[derive(Debug, Clone)]
pub struct Tag<L, P> {
    label: L,
    parser: P,
}

impl<L, P> Tag<L, P> {
    pub fn new(label: L, parser: P) -> Self {
        Self { label, parser }
    }
}

impl<L: Clone, P: Parser> Parser for Tag<L, P> {
    type Output = (L, P::Output);

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        self.parser
            .parse(args)
            .map(|parsed| parsed.map(|value| (self.label.clone(), value)))
    }
}

/// A labelled value as produced by [`Tag`], possibly absent as in the output
/// of [`SomeOf`].
pub trait Tagged {
    type Label;
    type Value;

    fn into_pair(self) -> Option<(Self::Label, Self::Value)>;
}

impl<L, T> Tagged for (L, T) {
    type Label = L;
    type Value = T;

    fn into_pair(self) -> Option<(L, T)> {
        Some(self)
    }
}

impl<L, T> Tagged for Option<(L, T)> {
    type Label = L;
    type Value = T;

    fn into_pair(self) -> Option<(L, T)> {
        self
    }
}

/// Collects tagged values into a label to value map.
#[derive(Debug, Clone)]
pub struct MapDict<P> {
    parser: P,
}

impl<P> MapDict<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P> Parser for MapDict<P>
where
    P: Parser,
    P::Output: IntoIterator,
    <P::Output as IntoIterator>::Item: Tagged,
    <<P::Output as IntoIterator>::Item as Tagged>::Label: Eq + Hash,
{
    type Output = HashMap<
        <<P::Output as IntoIterator>::Item as Tagged>::Label,
        <<P::Output as IntoIterator>::Item as Tagged>::Value,
    >;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        self.parser.parse(args).map(|parsed| {
            parsed.map(|items| items.into_iter().filter_map(Tagged::into_pair).collect())
        })
    }
}

/// The value together with the tokens that produced it.
#[derive(Debug, Clone)]
pub struct Capture<P> {
    parser: P,
}

impl<P> Capture<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for Capture<P> {
    type Output = (Vec<String>, P::Output);

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        self.parser.parse(args).map(|parsed| {
            let words = captured(args, parsed.consumed);
            parsed.map(|value| (words, value))
        })
    }
}

/// Only the tokens the sub-parser consumed.
///
/// Useful to validate a sub-grammar now and re-parse its words later, or to
/// put parsers of unrelated types under one [`OneOf`].
#[derive(Debug, Clone)]
pub struct CaptureOnly<P> {
    parser: P,
}

impl<P> CaptureOnly<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for CaptureOnly<P> {
    type Output = Vec<String>;

    fn parse(&self, args: &[&str]) -> ParseResult<Vec<String>> {
        self.parser
            .parse(args)
            .map(|parsed| Parsed::new(captured(args, parsed.consumed), parsed.consumed))
    }
}

fn captured(args: &[&str], consumed: usize) -> Vec<String> {
    args[..consumed].iter().map(|arg| arg.to_string()).collect()
}

/// Repeats a parser for as long as it succeeds.
#[derive(Debug, Clone)]
pub struct List<P> {
    parser: P,
}

impl<P> List<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: Parser> Parser for List<P> {
    type Output = Vec<P::Output>;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        let mut values = Vec::new();
        let mut consumed = 0;
        while consumed < args.len() {
            match self.parser.parse(&args[consumed..]) {
                Ok(parsed) if parsed.consumed == 0 => {
                    return Err(ParseFail::new(
                        "List element parser consumed nothing, cannot iterate",
                        consumed,
                    ));
                }
                Ok(parsed) => {
                    values.push(parsed.value);
                    consumed += parsed.consumed;
                }
                Err(_) => break,
            }
        }
        Ok(Parsed::new(values, consumed))
    }
}
