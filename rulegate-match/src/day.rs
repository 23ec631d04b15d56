//! Day-of-week windows
//!
//! Weekdays are indexed from 0 (Sunday) to 6 (Saturday).

use crate::error::{Result, ValidateError};
use chrono::Weekday;
use std::fmt;

const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

const ALL_DAYS: u8 = 0b111_1111;
const WEEKDAYS: u8 = 0b011_1110;
const WEEKENDS: u8 = 0b100_0001;

/// Set of allowed weekdays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayWindow {
    days: u8,
}

impl DayWindow {
    /// Parse a day list such as `weekdays`, `mon,wed fri` or `weekends, monday`
    ///
    /// Tokens are separated by commas and/or whitespace and may be full names,
    /// three-letter abbreviations, `weekdays` or `weekends`. A leading `!`
    /// selects every day not listed.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut days = 0u8;
        let mut seen_token = false;

        for token in body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            seen_token = true;
            days |= match token.to_ascii_lowercase().as_str() {
                "weekdays" => WEEKDAYS,
                "weekends" => WEEKENDS,
                name => match lookup(name) {
                    Some(index) => 1 << index,
                    None => return Err(ValidateError::invalid(text, "unknown day name")),
                },
            };
        }

        if !seen_token {
            return Err(ValidateError::invalid(text, "no days given"));
        }

        if negated {
            days = !days & ALL_DAYS;
        }

        if days == 0 {
            return Err(ValidateError::invalid(text, "day list selects no days"));
        }

        Ok(Self { days })
    }

    /// Raw set, bit `i` for weekday index `i`
    pub fn bits(&self) -> u8 {
        self.days
    }

    /// Check a weekday index, 0 (Sunday) to 6 (Saturday)
    pub fn contains(&self, weekday_index: u8) -> bool {
        weekday_index < 7 && self.days & (1 << weekday_index) != 0
    }

    pub fn contains_weekday(&self, weekday: Weekday) -> bool {
        // num_days_from_sunday is always 0..=6
        self.contains(weekday.num_days_from_sunday() as u8)
    }
}

impl fmt::Display for DayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = DAY_NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| self.days & (1 << i) != 0)
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join(","))
    }
}

impl std::str::FromStr for DayWindow {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Look up a single weekday by full name or three-letter abbreviation
pub fn name_to_index(name: &str) -> Result<u8> {
    lookup(&name.trim().to_ascii_lowercase()).ok_or_else(|| ValidateError::NotFound {
        name: name.to_string(),
    })
}

/// `name` must already be lowercase
fn lookup(name: &str) -> Option<u8> {
    DAY_NAMES
        .iter()
        .position(|day| *day == name || (name.len() == 3 && day.starts_with(name)))
        .map(|i| i as u8)
}
