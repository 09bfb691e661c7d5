//! Parsers that look at single tokens (or all of them) without delegating.

use crate::parser::Parser;
use crate::result::{ParseFail, ParseResult, Parsed};

/// Succeeds with `()` only when there is no input left.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl Parser for Empty {
    type Output = ();

    fn parse(&self, args: &[&str]) -> ParseResult<()> {
        if args.is_empty() {
            Ok(Parsed::new((), 0))
        } else {
            Err(ParseFail::new("Expected no more arguments", 0))
        }
    }
}

/// Any single token.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyStr;

impl Parser for AnyStr {
    type Output = String;

    fn parse(&self, args: &[&str]) -> ParseResult<String> {
        match args.first() {
            Some(arg) => Ok(Parsed::new(arg.to_string(), 1)),
            None => Err(ParseFail::no_argument()),
        }
    }
}

/// All remaining tokens joined with single spaces; needs at least one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestAsStr;

impl Parser for RestAsStr {
    type Output = String;

    fn parse(&self, args: &[&str]) -> ParseResult<String> {
        if args.is_empty() {
            return Err(ParseFail::no_argument());
        }
        Ok(Parsed::new(args.join(" "), args.len()))
    }
}

/// All remaining tokens joined with single spaces; empty input gives `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concat;

impl Parser for Concat {
    type Output = String;

    fn parse(&self, args: &[&str]) -> ParseResult<String> {
        Ok(Parsed::new(args.join(" "), args.len()))
    }
}

fn match_fixed(word: &str, args: &[&str]) -> Result<(), ParseFail> {
    match args.first() {
        None => Err(ParseFail::no_argument()),
        Some(arg) if arg.eq_ignore_ascii_case(word) => Ok(()),
        Some(_) => Err(ParseFail::new(format!("Expected {word}"), 0)),
    }
}

/// A case-insensitive literal word, discarded.
#[derive(Debug, Clone)]
pub struct FixedStr {
    word: String,
}

impl FixedStr {
    pub fn new(word: impl Into<String>) -> Self {
        Self { word: word.into() }
    }
}

impl Parser for FixedStr {
    type Output = ();

    fn parse(&self, args: &[&str]) -> ParseResult<()> {
        match_fixed(&self.word, args).map(|()| Parsed::new((), 1))
    }
}

/// A case-insensitive literal word, returned as typed by the user.
#[derive(Debug, Clone)]
pub struct CaptureFixedStr {
    word: String,
}

impl CaptureFixedStr {
    pub fn new(word: impl Into<String>) -> Self {
        Self { word: word.into() }
    }
}

impl Parser for CaptureFixedStr {
    type Output = String;

    fn parse(&self, args: &[&str]) -> ParseResult<String> {
        match_fixed(&self.word, args).map(|()| Parsed::new(args[0].to_string(), 1))
    }
}

/// Matches a regular expression against the first token only.
///
/// The pattern is anchored at the start of the token (but not at the end,
/// add `$` for that). The value holds capture groups 1..n in order, `None`
/// for groups that did not participate.
#[derive(Debug, Clone)]
pub struct Regex {
    regex: regex::Regex,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = regex::Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self { regex })
    }

    pub(crate) fn captures(&self, arg: &str) -> Option<Vec<Option<String>>> {
        self.regex.captures(arg).map(|captures| {
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        })
    }
}

impl Parser for Regex {
    type Output = Vec<Option<String>>;

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        match self.captures(arg) {
            Some(groups) => Ok(Parsed::new(groups, 1)),
            None => Err(ParseFail::new(
                format!("Failed to match regex {} with {arg}", self.regex.as_str()),
                0,
            )),
        }
    }
}

/// A non-negative decimal integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

impl Parser for Int {
    type Output = i64;

    fn parse(&self, args: &[&str]) -> ParseResult<i64> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        let invalid = || ParseFail::new(format!("Invalid integer \"{arg}\""), 0);
        if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        arg.parse::<i64>()
            .map(|value| Parsed::new(value, 1))
            .map_err(|_| invalid())
    }
}

/// `on`/`true`/`1` or `off`/`false`/`0`, case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl Parser for Bool {
    type Output = bool;

    fn parse(&self, args: &[&str]) -> ParseResult<bool> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        match arg.to_lowercase().as_str() {
            "on" | "true" | "1" => Ok(Parsed::new(true, 1)),
            "off" | "false" | "0" => Ok(Parsed::new(false, 1)),
            _ => Err(ParseFail::new(
                format!("Invalid argument \"{arg}\" for boolean"),
                0,
            )),
        }
    }
}

/// One of a fixed set of words, matched case-insensitively.
///
/// The value is the option as spelled in the set, so `cherry` parses to
/// `Cherry` when that is the registered spelling.
#[derive(Debug, Clone)]
pub struct OneOfStrings {
    options: Vec<String>,
}

impl OneOfStrings {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

impl Parser for OneOfStrings {
    type Output = String;

    fn parse(&self, args: &[&str]) -> ParseResult<String> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        match self
            .options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(arg))
        {
            Some(option) => Ok(Parsed::new(option.clone(), 1)),
            None => Err(ParseFail::new(
                format!("Expected one of {}", self.options.join(", ")),
                0,
            )),
        }
    }
}

/// An enum whose variants are selected by a fixed word each.
pub trait Choice: Copy + 'static {
    /// All variants, in the order they are listed in error messages.
    const ALL: &'static [Self];

    /// The word that selects this variant.
    fn label(&self) -> &'static str;
}

/// One variant of a [`Choice`] enum, matched case-insensitively by label.
#[derive(Debug)]
pub struct OneOfEnumValue<E> {
    _choice: std::marker::PhantomData<fn() -> E>,
}

impl<E: Choice> OneOfEnumValue<E> {
    pub fn new() -> Self {
        Self {
            _choice: std::marker::PhantomData,
        }
    }
}

impl<E: Choice> Default for OneOfEnumValue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Choice> Parser for OneOfEnumValue<E> {
    type Output = E;

    fn parse(&self, args: &[&str]) -> ParseResult<E> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        match E::ALL
            .iter()
            .find(|choice| choice.label().eq_ignore_ascii_case(arg))
        {
            Some(choice) => Ok(Parsed::new(*choice, 1)),
            None => {
                let labels: Vec<&str> = E::ALL.iter().map(Choice::label).collect();
                Err(ParseFail::new(
                    format!("Expected one of {}", labels.join(", ")),
                    0,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(Empty.parse(&[]), Ok(Parsed::new((), 0)));
        assert_eq!(
            Empty.parse(&["hei"]),
            Err(ParseFail::new("Expected no more arguments", 0))
        );
    }

    #[test]
    fn test_any_str() {
        assert_eq!(AnyStr.parse(&[]), Err(ParseFail::no_argument()));
        assert_eq!(AnyStr.parse(&[""]), Ok(Parsed::new(String::new(), 1)));
        assert_eq!(
            AnyStr.parse(&["moi", "moi"]),
            Ok(Parsed::new("moi".to_string(), 1))
        );
    }

    #[test]
    fn test_rest_and_concat() {
        assert_eq!(RestAsStr.parse(&[]), Err(ParseFail::no_argument()));
        assert_eq!(
            RestAsStr.parse(&["a", "b", "c"]),
            Ok(Parsed::new("a b c".to_string(), 3))
        );
        assert_eq!(Concat.parse(&[]), Ok(Parsed::new(String::new(), 0)));
        assert_eq!(
            Concat.parse(&["0", "1"]),
            Ok(Parsed::new("0 1".to_string(), 2))
        );
    }

    #[test]
    fn test_fixed_str() {
        assert_eq!(FixedStr::new("foo").parse(&["FOO", "x"]), Ok(Parsed::new((), 1)));
        assert_eq!(
            FixedStr::new("foo").parse(&["bar"]),
            Err(ParseFail::new("Expected foo", 0))
        );
        assert_eq!(
            CaptureFixedStr::new("foo").parse(&["Foo"]),
            Ok(Parsed::new("Foo".to_string(), 1))
        );
        assert_eq!(
            CaptureFixedStr::new("foo").parse(&[]),
            Err(ParseFail::no_argument())
        );
    }

    #[test]
    fn test_regex_groups() {
        let some = |s: &str| Some(s.to_string());
        assert_eq!(
            Regex::new("(.*)").unwrap().parse(&[""]),
            Ok(Parsed::new(vec![some("")], 1))
        );
        assert_eq!(
            Regex::new("(.(oi))").unwrap().parse(&["moi"]),
            Ok(Parsed::new(vec![some("moi"), some("oi")], 1))
        );
        assert_eq!(
            Regex::new(".(o)(i)").unwrap().parse(&["moi"]),
            Ok(Parsed::new(vec![some("o"), some("i")], 1))
        );
        assert_eq!(
            Regex::new("(a)|(m)").unwrap().parse(&["moi"]),
            Ok(Parsed::new(vec![None, some("m")], 1))
        );
    }

    #[test]
    fn test_regex_only_looks_at_first_token_start() {
        let regex = Regex::new("oi").unwrap();
        assert!(regex.parse(&["moi"]).is_err());
        assert!(regex.parse(&["x", "oi"]).is_err());
        assert_eq!(regex.parse(&["oink"]), Ok(Parsed::new(vec![], 1)));
    }

    #[test]
    fn test_int() {
        assert_eq!(Int.parse(&["42", "x"]), Ok(Parsed::new(42, 1)));
        assert_eq!(Int.parse(&[]), Err(ParseFail::no_argument()));
        assert_eq!(
            Int.parse(&["4x"]),
            Err(ParseFail::new("Invalid integer \"4x\"", 0))
        );
        assert!(Int.parse(&["99999999999999999999999"]).is_err());
    }

    #[test]
    fn test_bool() {
        for word in ["on", "TRUE", "true", "1", "On"] {
            assert_eq!(Bool.parse(&[word]), Ok(Parsed::new(true, 1)), "{word}");
        }
        for word in ["off", "FALSE", "false", "0"] {
            assert_eq!(Bool.parse(&[word]), Ok(Parsed::new(false, 1)), "{word}");
        }
        assert_eq!(Bool.parse(&[]), Err(ParseFail::no_argument()));
        assert_eq!(
            Bool.parse(&[""]),
            Err(ParseFail::new("Invalid argument \"\" for boolean", 0))
        );
        assert_eq!(
            Bool.parse(&["moi"]),
            Err(ParseFail::new("Invalid argument \"moi\" for boolean", 0))
        );
    }

    #[test]
    fn test_one_of_strings() {
        let parser = OneOfStrings::new(["moi", "hei"]);
        assert_eq!(
            parser.parse(&["true"]),
            Err(ParseFail::new("Expected one of moi, hei", 0))
        );
        assert_eq!(parser.parse(&["HEI"]), Ok(Parsed::new("hei".to_string(), 1)));
        assert_eq!(parser.parse(&[]), Err(ParseFail::no_argument()));
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Greeting {
        Hello,
        World,
    }

    impl Choice for Greeting {
        const ALL: &'static [Self] = &[Greeting::Hello, Greeting::World];

        fn label(&self) -> &'static str {
            match self {
                Greeting::Hello => "Hello",
                Greeting::World => "world",
            }
        }
    }

    #[test]
    fn test_one_of_enum_value() {
        let parser = OneOfEnumValue::<Greeting>::new();
        assert_eq!(parser.parse(&[]), Err(ParseFail::no_argument()));
        assert_eq!(
            parser.parse(&["not"]),
            Err(ParseFail::new("Expected one of Hello, world", 0))
        );
        assert_eq!(parser.parse(&["hello"]), Ok(Parsed::new(Greeting::Hello, 1)));
        assert_eq!(parser.parse(&["World"]), Ok(Parsed::new(Greeting::World, 1)));
    }
}
