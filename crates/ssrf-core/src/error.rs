//! Core error types for ssrf-core.
//!
//! Every precondition and postcondition of the scheduling algorithm maps to a
//! [`ContractError`] variant. They signal caller or provider bugs and are never
//! retried. Storage and configuration failures get their own enums.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a [`GlobalDataProvider`](crate::GlobalDataProvider).
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for ssrf-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduling contract violations
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    /// Failure raised by the global data provider, passed through unchanged
    #[error(transparent)]
    Provider(ProviderError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pre/postcondition failures of the scheduling algorithm.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("grade {grade} should be one of the allowed grades ({min}..={max})")]
    InvalidGrade { grade: i32, min: i32, max: i32 },

    #[error("priority '{0}' should be one of low, medium, high")]
    InvalidPriority(String),

    #[error("number of reviews {0} should be > 0")]
    InvalidNumReviews(u32),

    #[error("number of reviews {0} cannot grow any further")]
    NumReviewsOverflow(u32),

    #[error("avg. grade {0} should be between 0.0 and 5.0")]
    InvalidAvgGrade(f64),

    #[error("difficulty {0} should be >= 0.0")]
    InvalidDifficulty(f64),

    #[error("interval {0} should be >= 1")]
    InvalidInterval(i64),

    #[error("min. interval {min} > max. interval {max}")]
    InvalidIntervalWindow { min: u32, max: u32 },

    #[error("workloads length {actual} doesn't match the {expected} days between min. and max. interval")]
    WorkloadSeriesLengthMismatch { expected: usize, actual: usize },

    #[error("avg. difficulties length {actual} doesn't match the workloads length {expected}")]
    DifficultySeriesLengthMismatch { expected: usize, actual: usize },

    #[error("workload {value} at index {index} should be >= 0")]
    InvalidWorkload { index: usize, value: i64 },

    #[error("workload {value} at index {index} leaves no room for another review")]
    WorkloadOverflow { index: usize, value: i64 },

    #[error("avg. difficulty {value} at index {index} should be >= 0.0")]
    InvalidAvgDifficulty { index: usize, value: f64 },

    #[error("load coefficient {value} at index {index} should be between 0.0 and 1.0")]
    InvalidLoadCoefficient { index: usize, value: f64 },

    #[error("re-review window of {0} hours should be between 0 and 8760")]
    InvalidRereviewWindow(i64),

    #[error("memorized unit has no next review to keep")]
    MissingNextReview,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// No learning unit with this id
    #[error("Learning unit not found: {0}")]
    UnitNotFound(String),

    /// A learning unit with this id already exists
    #[error("Learning unit already exists: {0}")]
    UnitExists(String),

    /// A stored column could not be decoded
    #[error("Corrupt value in column '{column}': {value}")]
    CorruptValue { column: String, value: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl CoreError {
    /// The contract violation behind this error, if any.
    pub fn as_contract(&self) -> Option<&ContractError> {
        match self {
            CoreError::Contract(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_error_converts_into_core_error() {
        let err: CoreError = ContractError::InvalidNumReviews(0).into();
        assert_eq!(
            err.as_contract(),
            Some(&ContractError::InvalidNumReviews(0))
        );
        assert_eq!(
            err.to_string(),
            "Contract violation: number of reviews 0 should be > 0"
        );
    }

    #[test]
    fn provider_error_is_transparent() {
        let source: ProviderError = "backend unavailable".into();
        let err = CoreError::Provider(source);
        assert_eq!(err.to_string(), "backend unavailable");
        assert!(err.as_contract().is_none());
    }

    #[test]
    fn locked_sqlite_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }
}
