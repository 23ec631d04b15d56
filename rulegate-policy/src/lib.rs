//! Rule configuration and evaluation on top of `rulegate-match`
//!
//! Rules are loaded from TOML, compiled once, then evaluated per event
//! against a source address and a local time.

pub mod config;
pub mod defines;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, RuleConfig, ScheduleConfig};
pub use defines::{DefineProvider, Defines};
pub use engine::{Rule, RuleSet, Schedule};
pub use error::{PolicyError, Result};
