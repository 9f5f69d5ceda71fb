//! Encryption barrier.
//!
//! Every value written through the barrier is encrypted with AES-256-GCM
//! before it reaches the storage backend, and decrypted on the way back.
//! Keys (storage paths) stay in plaintext so prefix listing keeps working,
//! and each value is bound to its key as associated data.
//! The barrier key lives only in process memory.

use std::fmt;
use std::sync::Arc;

use embercrypt_storage::StorageBackend;

use crate::crypto::{self, EncryptionKey};
use crate::error::BarrierError;

/// A storage backend wrapped in authenticated encryption.
pub struct Barrier {
    storage: Arc<dyn StorageBackend>,
    key: EncryptionKey,
}

impl Barrier {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, key: EncryptionKey) -> Self {
        Self { storage, key }
    }

    /// Read and decrypt a value. `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// - [`BarrierError::Crypto`] if decryption fails.
    /// - [`BarrierError::Storage`] if the storage backend fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BarrierError> {
        match self.storage.get(key).await? {
            None => Ok(None),
            Some(sealed) => Ok(Some(crypto::decrypt(&self.key, &sealed, key.as_bytes())?)),
        }
    }

    /// Encrypt and write a value.
    ///
    /// # Errors
    ///
    /// - [`BarrierError::Crypto`] if encryption fails.
    /// - [`BarrierError::Storage`] if the storage backend fails.
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), BarrierError> {
        let sealed = crypto::encrypt(&self.key, value, key.as_bytes())?;
        self.storage.put(key, &sealed).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BarrierError::Storage`] if the storage backend fails.
    pub async fn delete(&self, key: &str) -> Result<(), BarrierError> {
        self.storage.delete(key).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BarrierError::Storage`] if the storage backend fails.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, BarrierError> {
        Ok(self.storage.list(prefix).await?)
    }

    /// # Errors
    ///
    /// Returns [`BarrierError::Storage`] if the storage backend fails.
    pub async fn exists(&self, key: &str) -> Result<bool, BarrierError> {
        Ok(self.storage.exists(key).await?)
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier").finish_non_exhaustive()
    }
}
