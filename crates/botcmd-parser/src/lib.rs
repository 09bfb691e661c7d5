//! Typed parser combinators for chat commands.
//!
//! A command line is split on whitespace into tokens before it gets here.
//! Every parser takes a slice of those tokens and either produces a value
//! together with how many leading tokens it used, or a [`ParseFail`] saying
//! what went wrong and where.
//!
//! ```
//! use botcmd_parser::{Adjacent, Bool, OneOfStrings, Parser, Parsed};
//!
//! let climate = Adjacent::new(Bool, OneOfStrings::new(["Cherry", "Plum"]).valid_or_missing())
//!     .remaining();
//! assert_eq!(
//!     climate.parse(&["on", "cherry"]),
//!     Ok(Parsed::new((true, Some("Cherry".to_string())), 2))
//! );
//! assert_eq!(climate.parse(&["off"]), Ok(Parsed::new((false, None), 1)));
//! ```

pub mod adjacent;
pub mod combinators;
pub mod parser;
pub mod primitives;
pub mod result;
pub mod time;

pub use adjacent::Adjacent;
pub use combinators::{
    Capture, CaptureOnly, Delayed, IfThen, Keyword, List, Map, MapDict, OneOf, Optional,
    Remaining, Seq, SomeOf, Tag, Tagged, ValidOrMissing,
};
pub use parser::{BoxedParser, Parser};
pub use primitives::{
    AnyStr, Bool, CaptureFixedStr, Choice, Concat, Empty, FixedStr, Int, OneOfEnumValue,
    OneOfStrings, Regex, RestAsStr,
};
pub use result::{ParseFail, ParseResult, Parsed};
pub use time::{Date, DateTime, HourMinute, Interval, Time, TimeOrDateTime};
