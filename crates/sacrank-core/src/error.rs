//! Core error types for sacrank-core.
//!
//! Per-record data problems are [`ValidationError`]s and never abort a
//! ranking pass. Configuration problems are [`ConfigError`]s and fail the
//! whole call. [`StoreError`] covers the CSV record store.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Strategy name is not one of the known strategies
    #[error("Unknown ranking strategy '{0}' (expected 'ratio' or 'complement')")]
    UnknownStrategy(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Dot-path key does not exist in the configuration
    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A single field of a record is malformed or out of its domain
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Required data file does not exist
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),

    /// CSV reader/writer failure
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// IO failure while reading or writing a data file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record cannot be expressed in the target file layout
    #[error("Record '{0}' has no difficulty column value; only level or scalar difficulty can be saved")]
    Unrepresentable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_names_field() {
        let err = ValidationError::invalid("target_score", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid input for 'target_score': must be greater than 0"
        );
    }

    #[test]
    fn store_error_names_the_record() {
        let err = StoreError::Unrepresentable("Bio SAC".into());
        assert!(err.to_string().contains("'Bio SAC'"));
    }
}
