//! Storage error types.

/// Errors raised by a [`StorageBackend`](crate::StorageBackend).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be opened at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    #[error("failed to list keys with prefix '{prefix}': {reason}")]
    List { prefix: String, reason: String },

    /// A redb transaction could not be started or committed.
    #[error("transaction failed: {reason}")]
    Transaction { reason: String },

    /// The offloaded blocking task died before reporting back.
    #[error("storage task for '{operation}' did not complete: {reason}")]
    TaskJoin { operation: &'static str, reason: String },
}
