//! Evaluation harness error types.
//!
//! Errors split into two classes:
//!
//! - **Fatal**: missing source material (prompt sections, family files,
//!   benign list) or a sampling request the corpus cannot satisfy. These
//!   abort the current operation.
//! - **Non-fatal**: malformed classification lines and incomplete coverage
//!   are *not* errors. They are diverted to the format-error log and the
//!   missing-domains file respectively, and the pipeline continues.

use thiserror::Error;

/// Evaluation harness errors.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A required source file or directory is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sampling request exceeds the unused pool of a domain source.
    #[error("Insufficient domains in '{pool}': requested {requested}, available {available}")]
    InsufficientDomains {
        /// Name of the domain pool (family name or "legitimate").
        pool: String,
        /// Number of domains requested.
        requested: usize,
        /// Number of unused domains remaining.
        available: usize,
    },

    /// Prompt assembly failed.
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Model provider returned an error after exhausting retries.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network communication error.
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Network(err.to_string())
    }
}

impl From<toml::de::Error> for EvalError {
    fn from(err: toml::de::Error) -> Self {
        EvalError::Config(err.to_string())
    }
}
