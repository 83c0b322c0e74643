//! Error taxonomy for sync operations.

use daybook_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Remote-storage failures are caught at the cloud client boundary,
/// classified here, and converted to notifications; none of them propagate
/// into or corrupt the local store. 304 Not Modified is success, not an
/// error, and never appears here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required credentials are missing; sync is a deliberate no-op.
    #[error("sync is not configured")]
    NotConfigured,

    /// The transport failed before producing a status (connection refused,
    /// DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Authentication was rejected (401/403). Notified distinctly from
    /// transient errors but currently retried the same way.
    #[error("authentication failed (status {0})")]
    Auth(u16),

    /// The server failed (5xx) or returned an unexpected client-error
    /// status; the local mutation already completed and the event is
    /// retried.
    #[error("server error (status {0})")]
    Server(u16),

    /// A redirect other than 304; a hard failure of the operation.
    #[error("unexpected redirect (status {0})")]
    Redirect(u16),

    /// Malformed JSON on import or pull; must not corrupt the local
    /// snapshot.
    #[error("malformed remote document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A local persistence failure while queueing or adopting state.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Classifies an HTTP status. Returns `None` for success (2xx) and for
    /// 304 Not Modified, which is success with no change.
    #[must_use]
    pub fn classify_status(status: u16) -> Option<SyncError> {
        match status {
            200..=299 | 304 => None,
            401 | 403 => Some(SyncError::Auth(status)),
            300..=399 => Some(SyncError::Redirect(status)),
            _ => Some(SyncError::Server(status)),
        }
    }

    /// Returns true if retrying this operation can succeed without user
    /// action. Auth failures count as retryable: stored credentials can be
    /// fixed out of band, and the queued event should deliver once they are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Server(_) | SyncError::Auth(_)
        )
    }
}
