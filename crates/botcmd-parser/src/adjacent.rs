//! Two parsers over one token stream with no delimiter between them.

use crate::parser::Parser;
use crate::result::{ParseFail, ParseResult, Parsed};

const NO_ADJACENT: &str = "No adjacent arguments parsed completely";

/// Parses a left value followed directly by a right value.
///
/// The boundary between the two is found by trial. The priority side gets the
/// longest span that lets both sides succeed: in the default left-priority
/// mode prefixes of the input are offered to the left parser longest first,
/// and with [`Adjacent::right_priority`] suffixes are offered to the right
/// parser longest first.
///
/// The search runs twice. The first pass only accepts a priority-side parse
/// that consumes the whole span it was offered; if that pass fails for any
/// reason, a second pass accepts partial consumption and its outcome is final.
///
/// ```
/// use botcmd_parser::{Adjacent, Concat, Parser, Parsed};
///
/// let left = Adjacent::new(Concat.remaining(), Concat.remaining());
/// assert_eq!(
///     left.parse(&["0", "1"]),
///     Ok(Parsed::new(("0 1".to_string(), String::new()), 2))
/// );
///
/// let right = Adjacent::right_priority(Concat.remaining(), Concat.remaining());
/// assert_eq!(
///     right.parse(&["0", "1"]),
///     Ok(Parsed::new((String::new(), "0 1".to_string()), 2))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Adjacent<L, R> {
    left: L,
    right: R,
    right_priority: bool,
}

impl<L, R> Adjacent<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            right_priority: false,
        }
    }

    pub fn right_priority(left: L, right: R) -> Self {
        Self {
            left,
            right,
            right_priority: true,
        }
    }
}

impl<L: Parser, R: Parser> Adjacent<L, R> {
    fn parse_left_first(
        &self,
        args: &[&str],
        require_full: bool,
    ) -> ParseResult<(L::Output, R::Output)> {
        let left = (0..=args.len()).rev().find_map(|max_len| {
            self.left
                .parse(&args[..max_len])
                .ok()
                .filter(|left| !require_full || left.consumed == max_len)
        });
        let Some(left) = left else {
            return Err(ParseFail::new(NO_ADJACENT, 0));
        };

        let split = left.consumed;
        match self.right.parse(&args[split..]) {
            Ok(right) => Ok(Parsed::new(
                (left.value, right.value),
                split + right.consumed,
            )),
            Err(fail) => Err(fail.context("while parsing right argument").offset(split)),
        }
    }

    fn parse_right_first(
        &self,
        args: &[&str],
        require_full: bool,
    ) -> ParseResult<(L::Output, R::Output)> {
        let mut window = args;
        loop {
            let right = (0..=window.len()).rev().find_map(|max_len| {
                let start = window.len() - max_len;
                self.right
                    .parse(&window[start..])
                    .ok()
                    .filter(|right| !require_full || right.consumed == max_len)
                    .map(|right| (start, right))
            });

            if let Some((start, right)) = right {
                let left = self
                    .left
                    .parse(&window[..start])
                    .map_err(|fail| fail.context("while parsing left argument"))?;
                // no gap allowed between the left parse and the right span
                if left.consumed == start {
                    return Ok(Parsed::new(
                        (left.value, right.value),
                        left.consumed + right.consumed,
                    ));
                }
            }

            match window.split_last() {
                Some((_, shorter)) => window = shorter,
                None => return Err(ParseFail::new(NO_ADJACENT, 0)),
            }
        }
    }
}

impl<L: Parser, R: Parser> Parser for Adjacent<L, R> {
    type Output = (L::Output, R::Output);

    fn parse(&self, args: &[&str]) -> ParseResult<Self::Output> {
        let search = |require_full| {
            if self.right_priority {
                self.parse_right_first(args, require_full)
            } else {
                self.parse_left_first(args, require_full)
            }
        };
        search(true).or_else(|_| search(false))
    }
}
