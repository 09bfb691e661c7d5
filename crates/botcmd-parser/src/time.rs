//! Wall-clock times, dates and intervals.
//!
//! All values are naive local date-times; converting to an absolute instant
//! is up to the caller, which knows the time zone it runs in.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeDelta, Timelike};
use regex::{Captures, Regex};

use crate::adjacent::Adjacent;
use crate::parser::Parser;
use crate::result::{ParseFail, ParseResult, Parsed};

static HOUR_MINUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("hour:minute regex"));

static INTERVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]{1,4})h)?(?:([0-9]{1,4})m)?$").expect("interval regex")
});

static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]{1,2}):?([0-9]{2})|(?:([0-9]{1,4})h)?(?:([0-9]{1,4})m)?)$")
        .expect("time regex")
});

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").expect("date regex"));

fn group(captures: &Captures<'_>, index: usize) -> Option<u32> {
    captures
        .get(index)
        .and_then(|group| group.as_str().parse().ok())
}

fn time_of_day(hour: u32, minute: u32) -> Result<NaiveTime, ParseFail> {
    if hour > 23 {
        return Err(ParseFail::new("Hour cannot be >23", 0));
    }
    if minute > 59 {
        return Err(ParseFail::new("Minute cannot be >59", 0));
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ParseFail::new("Failed to parse hh:mm", 0))
}

/// Hours and minutes given as `XhYm`, `Xh` or `Ym`.
fn hours_minutes(captures: &Captures<'_>, hours: usize, minutes: usize) -> Option<TimeDelta> {
    let h = group(captures, hours);
    let m = group(captures, minutes);
    if h.is_none() && m.is_none() {
        return None;
    }
    Some(TimeDelta::hours(h.unwrap_or(0).into()) + TimeDelta::minutes(m.unwrap_or(0).into()))
}

/// `hh:mm` as a time of day.
#[derive(Debug, Clone, Copy, Default)]
pub struct HourMinute;

impl Parser for HourMinute {
    type Output = NaiveTime;

    fn parse(&self, args: &[&str]) -> ParseResult<NaiveTime> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        let captures = HOUR_MINUTE
            .captures(arg)
            .ok_or_else(|| ParseFail::new("Failed to parse hh:mm", 0))?;
        let (Some(hour), Some(minute)) = (group(&captures, 1), group(&captures, 2)) else {
            return Err(ParseFail::new("Failed to parse hh:mm", 0));
        };
        time_of_day(hour, minute).map(|time| Parsed::new(time, 1))
    }
}

/// A duration such as `1h`, `15m` or `1h30m`; at least one minute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interval;

impl Parser for Interval {
    type Output = TimeDelta;

    fn parse(&self, args: &[&str]) -> ParseResult<TimeDelta> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        let delta = INTERVAL
            .captures(arg)
            .and_then(|captures| hours_minutes(&captures, 1, 2))
            .ok_or_else(|| ParseFail::new("Failed to parse time interval", 0))?;
        if delta < TimeDelta::minutes(1) {
            return Err(ParseFail::new("Too short interval", 0));
        }
        Ok(Parsed::new(delta, 1))
    }
}

/// A point in time given either as a time of day (`hh:mm` or `hhmm`) or as a
/// delay from now (`XhYm`).
///
/// A time of day resolves to its next occurrence at or after now. When now
/// has a fractional second it is first rounded up to the next whole second.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    now: Option<NaiveDateTime>,
}

impl Time {
    /// Resolves against the local clock at parse time.
    pub fn new() -> Self {
        Self { now: None }
    }

    /// Resolves against a fixed `now`.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> NaiveDateTime {
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());
        if now.nanosecond() == 0 {
            now
        } else {
            now.trunc_subsecs(0) + TimeDelta::seconds(1)
        }
    }
}

impl Parser for Time {
    type Output = NaiveDateTime;

    fn parse(&self, args: &[&str]) -> ParseResult<NaiveDateTime> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        let captures = TIME
            .captures(arg)
            .ok_or_else(|| ParseFail::new("Failed to parse hh:mm", 0))?;
        let now = self.now();

        if captures.get(1).is_some() {
            let (Some(hour), Some(minute)) = (group(&captures, 1), group(&captures, 2)) else {
                return Err(ParseFail::new("Failed to parse hh:mm", 0));
            };
            let mut time = now.date().and_time(time_of_day(hour, minute)?);
            while time < now {
                time += TimeDelta::days(1);
            }
            Ok(Parsed::new(time, 1))
        } else {
            let delta = hours_minutes(&captures, 3, 4)
                .ok_or_else(|| ParseFail::new("Failed to parse relative time", 0))?;
            Ok(Parsed::new(now + delta, 1))
        }
    }
}

/// A calendar date as `yyyy-mm-dd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Date;

impl Parser for Date {
    type Output = NaiveDate;

    fn parse(&self, args: &[&str]) -> ParseResult<NaiveDate> {
        let Some(arg) = args.first() else {
            return Err(ParseFail::no_argument());
        };
        let captures = DATE
            .captures(arg)
            .ok_or_else(|| ParseFail::new("Failed to parse date", 0))?;
        let date = match (group(&captures, 1), group(&captures, 2), group(&captures, 3)) {
            (Some(year), Some(month), Some(day)) if year > 0 => {
                i32::try_from(year)
                    .ok()
                    .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
            }
            _ => None,
        };
        date.map(|date| Parsed::new(date, 1))
            .ok_or_else(|| ParseFail::new("Invalid date", 0))
    }
}

/// `yyyy-mm-dd hh:mm`, two tokens.
#[derive(Debug, Clone)]
pub struct DateTime {
    parser: Adjacent<Date, HourMinute>,
}

impl DateTime {
    pub fn new() -> Self {
        Self {
            parser: Adjacent::new(Date, HourMinute),
        }
    }
}

impl Default for DateTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for DateTime {
    type Output = NaiveDateTime;

    fn parse(&self, args: &[&str]) -> ParseResult<NaiveDateTime> {
        self.parser
            .parse(args)
            .map(|parsed| parsed.map(|(date, time)| date.and_time(time)))
    }
}

/// [`DateTime`] when the input starts with a date, otherwise [`Time`].
#[derive(Debug, Clone, Default)]
pub struct TimeOrDateTime {
    time: Time,
    date_time: DateTime,
}

impl TimeOrDateTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            time: Time::at(now),
            date_time: DateTime::new(),
        }
    }
}

impl Parser for TimeOrDateTime {
    type Output = NaiveDateTime;

    fn parse(&self, args: &[&str]) -> ParseResult<NaiveDateTime> {
        if args.is_empty() {
            return Err(ParseFail::no_argument());
        }
        if Date.parse(&args[..1]).is_ok() {
            self.date_time.parse(args)
        } else {
            self.time.parse(args)
        }
    }
}
