//! Configuration schema types
//!
//! Rule fields hold rule text; it is parsed when the rule is compiled.

use crate::defines::Defines;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Complete rule configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defines: Defines,
    /// Named rules, kept in file order
    #[serde(default)]
    pub rules: IndexMap<String, RuleConfig>,
}

/// One access/scheduling rule
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub description: String,
    /// Source addresses to allow; empty allows any well-formed address
    #[serde(default)]
    pub allow_ips: Vec<String>,
    /// Source addresses to deny, checked before `allow_ips`
    #[serde(default)]
    pub deny_ips: Vec<String>,
    /// Time-of-day window, e.g. `"8:00 am - 6:00 pm"` or `"!22:00-06:00"`
    #[serde(default)]
    pub time: Option<String>,
    /// Day-of-week window, e.g. `"weekdays"` or `"sat,sun"`
    #[serde(default)]
    pub days: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
}

/// Periodic schedule attached to a rule
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Interval in seconds
    pub interval: i64,
    /// Strict 24-hour `HH:MM`; forces the interval to whole days
    #[serde(default)]
    pub scan_time: Option<String>,
    /// Single weekday; forces the interval to whole weeks
    #[serde(default)]
    pub scan_day: Option<String>,
}
