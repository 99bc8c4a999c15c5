//! Error types for the sync client.

use thiserror::Error;

/// Failures of a sync cycle or a local mutation.
///
/// None of these are fatal to the process: the caller reports them and the
/// previously committed state stays in place.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("storage write failed: {0}")]
    StorageWrite(#[from] StorageError),

    #[error("conflict resolution abandoned")]
    ResolutionAbandoned,

    #[error("a sync cycle is already in progress")]
    CycleInProgress,

    #[error("engine error: {0}")]
    Engine(#[from] quotesync_engine::Error),
}

impl SyncError {
    /// Whether the caller may simply try again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable(_) | SyncError::CycleInProgress
        )
    }
}

/// Errors from a [`LocalStore`](crate::storage::LocalStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write rejected for key '{0}'")]
    Rejected(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::RemoteUnavailable("empty snapshot".into());
        assert_eq!(err.to_string(), "remote unavailable: empty snapshot");

        let err = SyncError::from(StorageError::Rejected("quotes".into()));
        assert_eq!(
            err.to_string(),
            "storage write failed: write rejected for key 'quotes'"
        );

        let err = SyncError::from(quotesync_engine::Error::InvalidQuote("text is empty".into()));
        assert_eq!(err.to_string(), "engine error: invalid quote: text is empty");
    }

    #[test]
    fn transient_errors() {
        assert!(SyncError::RemoteUnavailable("timeout".into()).is_transient());
        assert!(SyncError::CycleInProgress.is_transient());
        assert!(!SyncError::ResolutionAbandoned.is_transient());
    }
}
