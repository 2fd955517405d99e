//! Error types for dataset construction.
//!
//! Errors fall into two groups:
//!
//! - **Run-fatal**: malformed logs, invalid or mismatched configuration, I/O and
//!   serialization failures. These abort before any array is written.
//! - **Instance-fatal**: [`DatasetError::TruncatedTrace`]. The pipeline skips the
//!   affected instance, records a [`crate::pipeline::SkipReason`] and continues.

use crate::schema::SolverKind;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Dataset construction errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// A log row could not be parsed, or the per-solver logs disagree about
    /// which instances exist (strict three-way join).
    #[error("malformed log {source_name}: {message}")]
    MalformedLog {
        /// Log file or stream the problem was found in
        source_name: String,
        /// Human-readable description
        message: String,
    },

    /// A solver's queue ran dry before the instance reached its termination
    /// condition.
    #[error(
        "truncated trace for instance {instance_id}: {solver} stream ended after {frames} frame(s) \
         before reaching optimality or the time budget"
    )]
    TruncatedTrace {
        /// Affected instance
        instance_id: String,
        /// Solver whose stream underflowed
        solver: SolverKind,
        /// Frames emitted before the underflow
        frames: usize,
    },

    /// Configuration values that cannot be combined (e.g. a switching interval
    /// that is not a multiple of the checkpoint interval).
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Array dimensions that do not line up.
    #[error("shape error: {0}")]
    Shape(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to write a `.npy` file
    #[error("failed to write npy: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// Failed to read a `.npy` file
    #[error("failed to read npy: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// TOML / JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DatasetError {
    /// Build a [`DatasetError::MalformedLog`].
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedLog {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error only invalidates a single instance.
    pub fn is_instance_local(&self) -> bool {
        matches!(self, Self::TruncatedTrace { .. })
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for DatasetError {
    fn from(e: toml::de::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for DatasetError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
