//! Error types for shakesummary.
//!
//! Uses `thiserror` for library-style error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an event summary.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Malformed geometry or coordinate input
    #[error("Invalid data: {0}")]
    Validation(String),

    /// Timestamp did not match any recognised encoding
    #[error("Unrecognized timestamp format: '{input}'")]
    Timestamp { input: String },

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading an input or catalog file failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration value is out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A required part of the event record is absent
    #[error("Missing event data: {0}")]
    MissingData(String),
}

impl SummaryError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
