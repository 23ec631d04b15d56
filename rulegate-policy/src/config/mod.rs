//! Configuration management for rule sets

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, RuleConfig, ScheduleConfig};
