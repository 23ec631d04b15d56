//! Error types for rule configuration

use rulegate_match::ValidateError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Invalid rule {rule}: {source}")]
    InvalidRule {
        rule: String,
        source: ValidateError,
    },

    #[error("Rule not found: {rule}")]
    RuleNotFound { rule: String },

    #[error("Define not found: {high}.{low}")]
    DefineNotFound { high: String, low: String },

    #[error("Invalid define {high}.{low}: {source}")]
    InvalidDefine {
        high: String,
        low: String,
        source: ValidateError,
    },

    #[error("Rule {rule} lists {count} addresses, limit is {limit}")]
    TooManyEntries {
        rule: String,
        count: usize,
        limit: i64,
    },

    #[error("Failed to load config from {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
