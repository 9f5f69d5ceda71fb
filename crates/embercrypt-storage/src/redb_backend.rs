//! Persistent storage on a single redb file.
//!
//! redb is pure Rust, so the server builds without a C++ toolchain. Every
//! operation runs in its own transaction on the tokio blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{StorageBackend, StorageError};

/// All keys share one table; namespacing happens in the key itself.
const DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("data");

/// A storage backend backed by a redb database file.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn txn_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

impl RedbBackend {
    /// Open the database at `path`, creating the file and its table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |e: &dyn std::fmt::Display| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(&e))?;
        }

        let db = Database::create(path).map_err(|e| open_err(&e))?;

        let txn = db.begin_write().map_err(txn_err)?;
        txn.open_table(DATA_TABLE).map_err(|e| open_err(&e))?;
        txn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.display(), "redb storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    async fn blocking<T, F>(&self, operation: &'static str, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StorageError::TaskJoin {
                operation,
                reason: e.to_string(),
            })?
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_owned();
        self.blocking("get", move |db| {
            let read_err = |e: &dyn std::fmt::Display| StorageError::Read {
                key: key.clone(),
                reason: e.to_string(),
            };
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(DATA_TABLE).map_err(|e| read_err(&e))?;
            let value = table
                .get(key.as_str())
                .map_err(|e| read_err(&e))?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_owned();
        let value = value.to_vec();
        self.blocking("put", move |db| {
            let write_err = |e: &dyn std::fmt::Display| StorageError::Write {
                key: key.clone(),
                reason: e.to_string(),
            };
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(DATA_TABLE).map_err(|e| write_err(&e))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| write_err(&e))?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        self.blocking("delete", move |db| {
            let delete_err = |e: &dyn std::fmt::Display| StorageError::Delete {
                key: key.clone(),
                reason: e.to_string(),
            };
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(DATA_TABLE).map_err(|e| delete_err(&e))?;
                table.remove(key.as_str()).map_err(|e| delete_err(&e))?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.to_owned();
        self.blocking("list", move |db| {
            let list_err = |e: &dyn std::fmt::Display| StorageError::List {
                prefix: prefix.clone(),
                reason: e.to_string(),
            };
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(DATA_TABLE).map_err(|e| list_err(&e))?;

            let mut keys = Vec::new();
            for item in table.range(prefix.as_str()..).map_err(|e| list_err(&e))? {
                let (k, _) = item.map_err(|e| list_err(&e))?;
                let key = k.value();
                if !key.starts_with(prefix.as_str()) {
                    break;
                }
                keys.push(key.to_owned());
            }
            Ok(keys)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("store.redb")).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn put_get_delete() {
        let (_dir, backend) = open_temp();
        backend.put("vaultpassword/entries/1", b"cipher").await.unwrap();
        assert_eq!(
            backend.get("vaultpassword/entries/1").await.unwrap(),
            Some(b"cipher".to_vec())
        );

        backend.delete("vaultpassword/entries/1").await.unwrap();
        assert!(!backend.exists("vaultpassword/entries/1").await.unwrap());
        backend.delete("vaultpassword/entries/1").await.unwrap();
    }

    #[tokio::test]
    async fn list_is_prefix_bounded() {
        let (_dir, backend) = open_temp();
        backend.put("a/2", b"").await.unwrap();
        backend.put("a/1", b"").await.unwrap();
        backend.put("b/1", b"").await.unwrap();

        assert_eq!(backend.list("a/").await.unwrap(), vec!["a/1", "a/2"]);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.redb");

        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put("k", b"persisted").await.unwrap();
        }

        let reopened = RedbBackend::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some(b"persisted".to_vec()));
    }
}
