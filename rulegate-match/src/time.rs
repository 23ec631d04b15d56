//! Time-of-day windows
//!
//! Accepted range forms, all normalized to `[!]HH:MM-HH:MM`:
//! - `hh:mm-hh:mm` and `hh-hh` (24 hour)
//! - `!hh:mm-hh:mm` (outside the range)
//! - `hh:mm am-hh:mm pm` and `hh am-hh pm` (12 hour)
//!
//! A window whose end is before its start runs past midnight.

use crate::error::{Result, ValidateError};
use chrono::{NaiveTime, Timelike};
use std::fmt;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// One side of a window, as written
#[derive(Debug, Clone, Copy)]
struct Clock {
    minutes: u32,
    meridiem: Option<Meridiem>,
}

/// A parsed time-of-day window or single instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: u32,
    end: u32,
    negated: bool,
    range: bool,
}

impl TimeWindow {
    /// Parse a range such as `22:00-06:00`, `!9-17` or `8:30 am - 5 pm`
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (first, second) = body
            .split_once('-')
            .ok_or_else(|| ValidateError::invalid(text, "expected a range separated by '-'"))?;

        if second.contains('-') {
            return Err(ValidateError::invalid(text, "more than one '-' in range"));
        }

        let start = parse_clock(text, first)?;
        let end = parse_clock(text, second)?;

        if start.meridiem.is_some() != end.meridiem.is_some() {
            return Err(ValidateError::invalid(
                text,
                "am/pm must be given on both ends of the range",
            ));
        }

        Ok(Self {
            start: start.minutes,
            end: end.minutes,
            negated,
            range: true,
        })
    }

    /// Parse a single time such as `14:30` or `2:30 pm`
    ///
    /// Ranges and negation are rejected.
    pub fn parse_unique(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        if trimmed.starts_with('!') {
            return Err(ValidateError::invalid(text, "negation is not allowed for a single time"));
        }
        if trimmed.contains('-') {
            return Err(ValidateError::invalid(text, "expected a single time, not a range"));
        }

        let clock = parse_clock(text, trimmed)?;

        Ok(Self {
            start: clock.minutes,
            end: clock.minutes,
            negated: false,
            range: false,
        })
    }

    /// Start as minutes since midnight
    pub fn start(&self) -> u32 {
        self.start
    }

    /// End as minutes since midnight
    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// False for a single instant parsed with [`TimeWindow::parse_unique`]
    pub fn is_range(&self) -> bool {
        self.range
    }

    /// True if the window runs past midnight
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Check whether `now_minutes` (minutes since midnight) falls in the window
    ///
    /// Both ends are inclusive, so a window whose start equals its end
    /// contains only that minute. Values past the end of the day never match.
    pub fn contains(&self, now_minutes: u32) -> bool {
        if now_minutes >= MINUTES_PER_DAY {
            return false;
        }

        let inside = if self.wraps() {
            now_minutes >= self.start || now_minutes <= self.end
        } else {
            self.start <= now_minutes && now_minutes <= self.end
        };

        inside != self.negated
    }

    /// Check whether the start of the window has been reached today
    pub fn is_after(&self, now_minutes: u32) -> bool {
        now_minutes < MINUTES_PER_DAY && now_minutes >= self.start
    }

    pub fn contains_time(&self, now: NaiveTime) -> bool {
        self.contains(minute_of_day(now))
    }

    pub fn is_after_time(&self, now: NaiveTime) -> bool {
        self.is_after(minute_of_day(now))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.range {
            return write_clock(f, self.start);
        }

        if self.negated {
            write!(f, "!")?;
        }
        write_clock(f, self.start)?;
        write!(f, "-")?;
        write_clock(f, self.end)
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Minutes since midnight, seconds dropped
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Validate a strict 24-hour `HH:MM` time
///
/// Used for scheduled scan times where 12-hour and range forms are not
/// accepted.
pub fn parse_simple_24h(text: &str) -> Result<String> {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();

    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
    if !well_formed {
        return Err(ValidateError::invalid(text, "expected HH:MM"));
    }

    let hour = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    let minute = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');

    if hour > 23 {
        return Err(ValidateError::invalid(text, "hour must be 0-23"));
    }
    if minute > 59 {
        return Err(ValidateError::invalid(text, "minute must be 0-59"));
    }

    Ok(format!("{:02}:{:02}", hour, minute))
}

fn write_clock(f: &mut fmt::Formatter<'_>, minutes: u32) -> fmt::Result {
    write!(f, "{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parse one side: `HH[:MM][ ]am|pm`
fn parse_clock(input: &str, half: &str) -> Result<Clock> {
    let lower = half.trim().to_ascii_lowercase();

    let (digits, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else {
        (lower.as_str(), None)
    };

    let (hour_str, minute_str) = match digits.split_once(':') {
        Some((hour, minute)) => (hour, Some(minute)),
        None => (digits, None),
    };

    let hour = parse_digits(hour_str, 1)
        .ok_or_else(|| ValidateError::invalid(input, "hour must be one or two digits"))?;

    let minute = match minute_str {
        Some(minute) => parse_digits(minute, 2)
            .ok_or_else(|| ValidateError::invalid(input, "minute must be two digits"))?,
        None => 0,
    };

    if minute > 59 {
        return Err(ValidateError::invalid(input, "minute must be 0-59"));
    }

    let hour = match meridiem {
        None => {
            if hour > 23 {
                return Err(ValidateError::invalid(input, "hour must be 0-23"));
            }
            hour
        }
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return Err(ValidateError::invalid(input, "hour must be 1-12 with am/pm"));
            }
            match m {
                Meridiem::Am => hour % 12,
                Meridiem::Pm => hour % 12 + 12,
            }
        }
    };

    Ok(Clock {
        minutes: hour * 60 + minute,
        meridiem,
    })
}

/// Parse `min_len` to two ASCII digits
fn parse_digits(s: &str, min_len: usize) -> Option<u32> {
    if s.len() < min_len || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
