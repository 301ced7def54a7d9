//! Error types for the attestation batcher

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, AttestError>;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum AttestError {
    /// Input file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV tokenizer error
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Row shape does not match the schema
    #[error(
        "CSV has incorrect number of elements: {invalid_rows} row(s) invalid, \
         first at line {first_line} (expected {expected} fields, found {found})"
    )]
    Validation {
        invalid_rows: usize,
        first_line: u64,
        expected: usize,
        found: usize,
    },

    /// Schema or field encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// RPC provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Contract call or gas estimation error
    #[error("Contract error: {0}")]
    Contract(String),

    /// A batch failed to submit; later batches were not sent
    #[error("Batch {batch} (nonce {nonce}) failed: {source}")]
    Submission {
        batch: usize,
        nonce: u64,
        #[source]
        source: Box<AttestError>,
    },
}

impl From<config::ConfigError> for AttestError {
    fn from(err: config::ConfigError) -> Self {
        AttestError::Configuration(err.to_string())
    }
}
