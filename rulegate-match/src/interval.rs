//! Interval validation for periodic schedules

use crate::error::{Result, ValidateError};

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Unit an interval must be a whole multiple of
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Any positive interval
    #[default]
    None,
    Day,
    Week,
}

impl Alignment {
    /// Length of the unit in seconds, or None when unaligned
    pub fn unit_seconds(&self) -> Option<i64> {
        match self {
            Alignment::None => None,
            Alignment::Day => Some(SECONDS_PER_DAY),
            Alignment::Week => Some(SECONDS_PER_WEEK),
        }
    }

    fn unit_name(&self) -> &'static str {
        match self {
            Alignment::None => "second",
            Alignment::Day => "day",
            Alignment::Week => "week",
        }
    }
}

/// Accept `interval` unchanged if it is positive and aligned
pub fn validate(interval: i64, alignment: Alignment) -> Result<i64> {
    check_positive(interval)?;

    match alignment.unit_seconds() {
        Some(unit) if interval % unit != 0 => {
            tracing::debug!("Interval {} rejected: not a multiple of a {}", interval, alignment.unit_name());
            Err(ValidateError::NotAligned {
                interval,
                unit: alignment.unit_name(),
            })
        }
        _ => Ok(interval),
    }
}

/// Round a positive `interval` up to the next aligned value
pub fn round_up(interval: i64, alignment: Alignment) -> Result<i64> {
    check_positive(interval)?;

    let Some(unit) = alignment.unit_seconds() else {
        return Ok(interval);
    };

    let units = interval / unit + i64::from(interval % unit != 0);
    units.checked_mul(unit).ok_or(ValidateError::OutOfRange {
        value: interval,
        min: 1,
        max: i64::MAX / unit * unit,
    })
}

fn check_positive(interval: i64) -> Result<()> {
    if interval <= 0 {
        tracing::debug!("Interval {} rejected: not positive", interval);
        return Err(ValidateError::OutOfRange {
            value: interval,
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_aligned() {
        assert_eq!(validate(SECONDS_PER_DAY, Alignment::Day), Ok(SECONDS_PER_DAY));
        assert_eq!(validate(3 * SECONDS_PER_DAY, Alignment::Day), Ok(3 * SECONDS_PER_DAY));
        assert_eq!(
            validate(90_000, Alignment::Day),
            Err(ValidateError::NotAligned {
                interval: 90_000,
                unit: "day"
            })
        );
    }

    #[test]
    fn test_week_aligned() {
        assert!(validate(SECONDS_PER_WEEK, Alignment::Week).is_ok());
        assert!(validate(2 * SECONDS_PER_WEEK, Alignment::Week).is_ok());
        assert!(matches!(
            validate(SECONDS_PER_DAY, Alignment::Week),
            Err(ValidateError::NotAligned { unit: "week", .. })
        ));
    }

    #[test]
    fn test_unaligned_accepts_any_positive() {
        assert_eq!(validate(1, Alignment::None), Ok(1));
        assert_eq!(validate(90_000, Alignment::None), Ok(90_000));
    }

    #[test]
    fn test_non_positive_is_out_of_range() {
        for alignment in [Alignment::None, Alignment::Day, Alignment::Week] {
            assert!(matches!(
                validate(-5, alignment),
                Err(ValidateError::OutOfRange { value: -5, .. })
            ));
            assert!(matches!(
                validate(0, alignment),
                Err(ValidateError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(90_000, Alignment::Day), Ok(2 * SECONDS_PER_DAY));
        assert_eq!(round_up(SECONDS_PER_DAY, Alignment::Day), Ok(SECONDS_PER_DAY));
        assert_eq!(round_up(1, Alignment::Week), Ok(SECONDS_PER_WEEK));
        assert_eq!(round_up(90_000, Alignment::None), Ok(90_000));
        assert!(round_up(-1, Alignment::Day).is_err());
        assert!(matches!(
            round_up(i64::MAX, Alignment::Week),
            Err(ValidateError::OutOfRange { .. })
        ));
    }
}
