//! Error types for local persistence.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting or loading local documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document failed to parse. The live snapshot is never replaced by
    /// a document that does not parse.
    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),
}
