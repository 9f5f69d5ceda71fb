//! Error types for `embercrypt-core`.
//!
//! Crypto errors never carry key material, only a description of what failed.

use embercrypt_storage::StorageError;

/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// Wrong key, corrupted ciphertext, or tampered tag.
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },

    #[error("key derivation failed for context '{context}': {reason}")]
    KeyDerivation { context: String, reason: String },

    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort { expected: usize, actual: usize },

    /// A master key supplied as text was not 32 bytes of base64.
    #[error("invalid master key: {reason}")]
    InvalidKey { reason: String },
}

/// Errors from the encryption barrier.
#[derive(Debug, thiserror::Error)]
pub enum BarrierError {
    #[error("barrier crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("barrier storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the vault password service.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// No entry is stored under the id.
    #[error("vault password {id} not found")]
    NotFound { id: i64 },

    /// The payload duplicates an existing entry.
    #[error("vault password conflicts with entry {existing_id}")]
    Conflict { existing_id: i64 },

    /// The id can never identify an entry (outside `1..=MAX_ID`).
    #[error("invalid vault password id {id}: ids range from 1 to 9007199254740991")]
    InvalidId { id: i64 },

    /// A stored record could not be (de)serialized.
    #[error("vault password record '{key}' is malformed: {reason}")]
    Corrupt { key: String, reason: String },

    /// Every id up to `MAX_ID` is taken.
    #[error("vault password id sequence exhausted")]
    SequenceExhausted,

    #[error("vault password storage error: {0}")]
    Barrier(#[from] BarrierError),
}
