//! Operator-tunable integer settings
//!
//! Settings are keyed by a (high, low) name pair, e.g. `rules.max_ip_entries`,
//! and every lookup is checked against bounds supplied by the caller.

use crate::error::{PolicyError, Result};
use indexmap::IndexMap;
use rulegate_match::ValidateError;
use serde::{Deserialize, Serialize};

/// Read-only source of integer settings
pub trait DefineProvider: Send + Sync {
    /// Look up `high.low` and check it lies in `min..=max`
    fn get_define_int(&self, high: &str, low: &str, min: i64, max: i64) -> Result<i64>;

    /// Like [`DefineProvider::get_define_int`], but a missing setting yields `default`
    ///
    /// A setting that is present but out of bounds is still an error.
    fn get_define_int_or(
        &self,
        high: &str,
        low: &str,
        min: i64,
        max: i64,
        default: i64,
    ) -> Result<i64> {
        match self.get_define_int(high, low, min, max) {
            Err(PolicyError::DefineNotFound { .. }) => {
                tracing::trace!("Define {}.{} not set, using {}", high, low, default);
                Ok(default)
            }
            other => other,
        }
    }
}

/// Settings table read from the `[defines.<high>]` sections of the config
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Defines {
    values: IndexMap<String, IndexMap<String, i64>>,
}

impl Defines {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, high: &str, low: &str, value: i64) {
        self.values
            .entry(high.to_string())
            .or_default()
            .insert(low.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|section| section.is_empty())
    }
}

impl DefineProvider for Defines {
    fn get_define_int(&self, high: &str, low: &str, min: i64, max: i64) -> Result<i64> {
        let value = self
            .values
            .get(high)
            .and_then(|section| section.get(low))
            .copied()
            .ok_or_else(|| PolicyError::DefineNotFound {
                high: high.to_string(),
                low: low.to_string(),
            })?;

        if value < min || value > max {
            return Err(PolicyError::InvalidDefine {
                high: high.to_string(),
                low: low.to_string(),
                source: ValidateError::OutOfRange { value, min, max },
            });
        }

        Ok(value)
    }
}
