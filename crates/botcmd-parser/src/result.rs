//! Parse outcomes shared by every parser.

use thiserror::Error;

pub(crate) const NO_ARGUMENT: &str = "No argument provided";

/// A successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    /// The parsed value.
    pub value: T,
    /// Number of leading tokens used from the input slice.
    pub consumed: usize,
}

impl<T> Parsed<T> {
    pub fn new(value: T, consumed: usize) -> Self {
        Self { value, consumed }
    }

    /// Transform the value, keeping the consumed count.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            consumed: self.consumed,
        }
    }
}

/// A failed parse.
///
/// Failures are ordinary values: combinators inspect them, try alternatives
/// and wrap them with context. `consumed` is how far the attempt got, counted
/// in tokens of the slice the failing parser was given, so that the final
/// caller can point at the offending token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseFail {
    pub message: String,
    pub consumed: usize,
}

impl ParseFail {
    pub fn new(message: impl Into<String>, consumed: usize) -> Self {
        Self {
            message: message.into(),
            consumed,
        }
    }

    /// The failure for a parser that needed a token but got none.
    pub fn no_argument() -> Self {
        Self::new(NO_ARGUMENT, 0)
    }

    /// Append `suffix` to the message, separated by a space.
    pub fn context(mut self, suffix: impl AsRef<str>) -> Self {
        self.message.push(' ');
        self.message.push_str(suffix.as_ref());
        self
    }

    /// Shift the failure position right by `tokens`, for failures coming from
    /// a parser that was handed a tail of the outer input.
    pub fn offset(mut self, tokens: usize) -> Self {
        self.consumed += tokens;
        self
    }
}

/// Result of running a parser over a token slice.
pub type ParseResult<T> = Result<Parsed<T>, ParseFail>;
