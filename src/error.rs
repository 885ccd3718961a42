//! # Loader Error Types
//!
//! Unified error handling for the relationship-loader library and CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Loader operation result type
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error types for loader operations
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to open input file {path}: {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Store unavailable: {endpoint} - {reason}")]
    StoreUnavailable { endpoint: String, reason: String },

    #[error("Write rejected by store: {code} - {message}")]
    WriteRejected { code: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{failed} of {dispatched} batches failed")]
    PartialFailure { failed: u64, dispatched: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoaderError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a malformed-record error carrying the offending line number
    pub fn malformed_record(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a store-unavailable error
    pub fn store_unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}
