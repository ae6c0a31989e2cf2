//! Error types for Gazefuse
//!
//! Structural errors in the offline logs are unrecoverable and abort the
//! pipeline before any alignment is attempted. Empty streams and unrepairable
//! gaps are not errors: they flow through as empty output or as
//! warning-level quality flags on the affected session.

use thiserror::Error;

/// Errors that can occur while loading and aligning session logs
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{path}: missing expected columns (expected {expected:?}, found {found:?})")]
    MissingColumns {
        path: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{path}:{line}: malformed row: {detail}")]
    MalformedRow {
        path: String,
        line: usize,
        detail: String,
    },

    #[error("{path}:{line}: unparsable timestamp {value:?}")]
    TimestampParse {
        path: String,
        line: usize,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to capture snapshot of {url} after {attempts} attempts")]
    SnapshotFailed { url: String, attempts: u32 },
}
