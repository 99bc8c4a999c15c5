//! Error types for the quotesync engine.

use thiserror::Error;

/// All possible errors from the quotesync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    #[error("malformed import data: {0}")]
    MalformedImport(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("unrecognized {0}")]
    Unrecognized(String),

    // Merge errors
    #[error("decision count mismatch: expected {expected}, got {actual}")]
    DecisionMismatch { expected: usize, actual: usize },

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidQuote("text is empty".into());
        assert_eq!(err.to_string(), "invalid quote: text is empty");

        let err = Error::MalformedImport("no valid quotes".into());
        assert_eq!(err.to_string(), "malformed import data: no valid quotes");

        let err = Error::DecisionMismatch {
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "decision count mismatch: expected 2, got 1"
        );

        let err = Error::InvalidSnapshot("unsupported snapshot format version: 9".into());
        assert_eq!(
            err.to_string(),
            "invalid snapshot: unsupported snapshot format version: 9"
        );
    }
}
