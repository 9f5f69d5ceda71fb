//! The vault password service.
//!
//! [`VaultPasswordService`] is the contract the HTTP layer is built against.
//! [`BarrierPasswordService`] is the default implementation: entries are
//! JSON documents written through the encryption [`Barrier`], keyed by a
//! zero-padded id so a prefix listing comes back in ascending id order.
//!
//! Ids come from a persisted sequence and are never handed out twice, even
//! after a delete. Caller-chosen ids (upsert) are capped at [`MAX_ID`];
//! once the sequence reaches the cap, creates fall back to the lowest free
//! id instead of failing. Mutations run under a single async mutex, which makes the
//! read-check-write of create/update/patch/delete atomic with respect to
//! each other: two concurrent creates of equivalent entries cannot both win.

use std::sync::Arc;

use chrono::Utc;
use embercrypt_storage::StorageBackend;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::barrier::Barrier;
use crate::crypto::{self, EncryptionKey};
use crate::error::{CryptoError, PasswordError};
use crate::password::VaultPassword;

const ENTRY_PREFIX: &str = "vaultpassword/entries/";
const SEQUENCE_KEY: &str = "vaultpassword/sequence";

/// HKDF info used to derive the barrier key for password entries.
pub const VAULT_PASSWORD_KEY_INFO: &[u8] = b"embercrypt-vaultpassword-v1";

/// Largest id an entry can have: 2^53 - 1, the largest integer every JSON
/// client can represent exactly.
pub const MAX_ID: i64 = (1 << 53) - 1;

/// Operations on vault password entries.
#[async_trait::async_trait]
pub trait VaultPasswordService: Send + Sync + 'static {
    /// All entries, ascending by id. Empty when nothing is stored.
    async fn find_all(&self) -> Result<Vec<VaultPassword>, PasswordError>;

    /// The entry stored under `id`, if any.
    async fn find_by_id(&self, id: i64) -> Result<Option<VaultPassword>, PasswordError>;

    /// Store a new entry under a freshly assigned id.
    ///
    /// Fails with [`PasswordError::Conflict`] if an equivalent entry exists.
    async fn create(&self, entry: VaultPassword) -> Result<VaultPassword, PasswordError>;

    /// Store `entry` under `id`, replacing whatever was there (upsert).
    async fn save(&self, id: i64, entry: VaultPassword) -> Result<VaultPassword, PasswordError>;

    /// Replace the entry named by `entry.id_password`.
    ///
    /// Fails with [`PasswordError::NotFound`] if it does not exist.
    async fn update(&self, entry: VaultPassword) -> Result<VaultPassword, PasswordError>;

    /// Change only the fields present in `patch`.
    ///
    /// Fails with [`PasswordError::NotFound`] if `id` does not exist.
    async fn partial_update(
        &self,
        id: i64,
        patch: VaultPassword,
    ) -> Result<VaultPassword, PasswordError>;

    /// Remove the entry under `id`.
    ///
    /// Fails with [`PasswordError::NotFound`] if it does not exist.
    async fn delete_by_id(&self, id: i64) -> Result<(), PasswordError>;
}

/// [`VaultPasswordService`] storing encrypted entries through a [`Barrier`].
#[derive(Debug)]
pub struct BarrierPasswordService {
    barrier: Arc<Barrier>,
    writes: Mutex<()>,
}

impl BarrierPasswordService {
    #[must_use]
    pub fn new(barrier: Arc<Barrier>) -> Self {
        Self {
            barrier,
            writes: Mutex::new(()),
        }
    }

    /// Build the service over `storage`, deriving the entry key from `master`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyDerivation`] if the sub-key cannot be derived.
    pub fn with_master_key(
        storage: Arc<dyn StorageBackend>,
        master: &EncryptionKey,
    ) -> Result<Self, CryptoError> {
        let key = crypto::derive_key(master, None, VAULT_PASSWORD_KEY_INFO)?;
        Ok(Self::new(Arc::new(Barrier::new(storage, key))))
    }

    fn entry_key(id: i64) -> String {
        format!("{ENTRY_PREFIX}{id:020}")
    }

    async fn load(&self, id: i64) -> Result<Option<VaultPassword>, PasswordError> {
        let key = Self::entry_key(id);
        let Some(bytes) = self.barrier.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PasswordError::Corrupt {
                key,
                reason: e.to_string(),
            })
    }

    async fn store(&self, id: i64, entry: &VaultPassword) -> Result<(), PasswordError> {
        let key = Self::entry_key(id);
        let bytes = serde_json::to_vec(entry).map_err(|e| PasswordError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.barrier.put(&key, &bytes).await?;
        Ok(())
    }

    async fn sequence(&self) -> Result<i64, PasswordError> {
        let Some(bytes) = self.barrier.get(SEQUENCE_KEY).await? else {
            return Ok(0);
        };
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| PasswordError::Corrupt {
                key: SEQUENCE_KEY.to_owned(),
                reason: "sequence is not a decimal integer".to_owned(),
            })
    }

    async fn set_sequence(&self, value: i64) -> Result<(), PasswordError> {
        self.barrier
            .put(SEQUENCE_KEY, value.to_string().as_bytes())
            .await?;
        Ok(())
    }

    /// Caller must hold `writes`.
    async fn next_id(&self) -> Result<i64, PasswordError> {
        let mut candidate = self.sequence().await?.saturating_add(1);
        // Upserts may already occupy ids above a sequence written by an
        // older store; skip them rather than overwrite.
        while candidate <= MAX_ID && self.barrier.exists(&Self::entry_key(candidate)).await? {
            candidate += 1;
        }
        if candidate > MAX_ID {
            return self.lowest_free_id().await;
        }
        self.set_sequence(candidate).await?;
        Ok(candidate)
    }

    /// Smallest positive id with no entry. Only used once the sequence is
    /// spent.
    async fn lowest_free_id(&self) -> Result<i64, PasswordError> {
        let mut expected = 1;
        for key in self.barrier.list(ENTRY_PREFIX).await? {
            let id = key
                .strip_prefix(ENTRY_PREFIX)
                .and_then(|digits| digits.parse::<i64>().ok());
            if id != Some(expected) {
                break;
            }
            expected += 1;
        }
        if expected > MAX_ID {
            return Err(PasswordError::SequenceExhausted);
        }
        warn!(id = expected, "id sequence exhausted, reusing a free id");
        Ok(expected)
    }

    /// Caller must hold `writes`.
    async fn advance_sequence_past(&self, id: i64) -> Result<(), PasswordError> {
        if self.sequence().await? < id {
            self.set_sequence(id).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VaultPasswordService for BarrierPasswordService {
    async fn find_all(&self) -> Result<Vec<VaultPassword>, PasswordError> {
        let keys = self.barrier.list(ENTRY_PREFIX).await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            // A concurrent delete between list and get just drops the entry.
            if let Some(bytes) = self.barrier.get(&key).await? {
                let entry = serde_json::from_slice(&bytes).map_err(|e| {
                    PasswordError::Corrupt {
                        key: key.clone(),
                        reason: e.to_string(),
                    }
                })?;
                entries.push(entry);
            }
        }
        debug!(count = entries.len(), "listed vault passwords");
        Ok(entries)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<VaultPassword>, PasswordError> {
        if id <= 0 {
            return Ok(None);
        }
        self.load(id).await
    }

    async fn create(&self, entry: VaultPassword) -> Result<VaultPassword, PasswordError> {
        let _guard = self.writes.lock().await;

        if let Some(id) = entry.id_password.filter(|id| *id > 0) {
            if self.barrier.exists(&Self::entry_key(id)).await? {
                return Err(PasswordError::Conflict { existing_id: id });
            }
        }

        let mut entry = entry.into_client_fields();
        for existing in self.find_all().await? {
            if existing.is_equivalent(&entry) {
                return Err(PasswordError::Conflict {
                    existing_id: existing.id_password.unwrap_or_default(),
                });
            }
        }

        let id = self.next_id().await?;
        let now = Utc::now();
        entry.id_password = Some(id);
        entry.created_at = Some(now);
        entry.updated_at = Some(now);
        self.store(id, &entry).await?;

        info!(id, "vault password created");
        Ok(entry)
    }

    async fn save(&self, id: i64, entry: VaultPassword) -> Result<VaultPassword, PasswordError> {
        if !(1..=MAX_ID).contains(&id) {
            return Err(PasswordError::InvalidId { id });
        }
        let _guard = self.writes.lock().await;

        let previous = self.load(id).await?;
        let now = Utc::now();
        let mut entry = entry.into_client_fields();
        entry.id_password = Some(id);
        entry.created_at = previous.as_ref().and_then(|p| p.created_at).or(Some(now));
        entry.updated_at = Some(now);

        self.store(id, &entry).await?;
        self.advance_sequence_past(id).await?;

        info!(id, created = previous.is_none(), "vault password saved");
        Ok(entry)
    }

    async fn update(&self, entry: VaultPassword) -> Result<VaultPassword, PasswordError> {
        let id = entry.id_password.unwrap_or_default();
        if id <= 0 {
            return Err(PasswordError::NotFound { id });
        }
        let _guard = self.writes.lock().await;

        let existing = self
            .load(id)
            .await?
            .ok_or(PasswordError::NotFound { id })?;

        let mut entry = entry.into_client_fields();
        entry.id_password = Some(id);
        entry.created_at = existing.created_at;
        entry.updated_at = Some(Utc::now());
        self.store(id, &entry).await?;

        info!(id, "vault password updated");
        Ok(entry)
    }

    async fn partial_update(
        &self,
        id: i64,
        patch: VaultPassword,
    ) -> Result<VaultPassword, PasswordError> {
        if id <= 0 {
            return Err(PasswordError::NotFound { id });
        }
        let _guard = self.writes.lock().await;

        let mut entry = self
            .load(id)
            .await?
            .ok_or(PasswordError::NotFound { id })?;
        entry.apply_patch(patch);
        entry.updated_at = Some(Utc::now());
        self.store(id, &entry).await?;

        info!(id, "vault password patched");
        Ok(entry)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), PasswordError> {
        if id <= 0 {
            return Err(PasswordError::NotFound { id });
        }
        let _guard = self.writes.lock().await;

        let key = Self::entry_key(id);
        if !self.barrier.exists(&key).await? {
            return Err(PasswordError::NotFound { id });
        }
        self.barrier.delete(&key).await?;

        info!(id, "vault password deleted");
        Ok(())
    }
}
