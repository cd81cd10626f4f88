//! Store handle implementation using fjall.

use std::fmt;
use std::path::{Path, PathBuf};

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::logging::trace;

use super::error::StoreError;

/// Keyspace holding user data.
const DATA_KEYSPACE: &str = "data";

/// An open storage instance at a single filesystem path.
///
/// A handle wraps one `fjall::Database` together with its data keyspace.
/// Handles are created by [`StoreRegistry::open`](super::StoreRegistry::open)
/// and shared via `Arc`; the engine's on-disk lock and in-memory resources
/// are released when the last clone is dropped.
pub struct StoreHandle {
    db: fjall::Database,
    data: Keyspace,
    path: PathBuf,
}

impl StoreHandle {
    /// Open the storage instance at `path` with default engine configuration,
    /// creating it if it does not exist.
    pub(crate) fn open(path: &Path) -> Result<Self, StoreError> {
        let open_failed = |source| StoreError::OpenFailed {
            path: path.display().to_string(),
            source,
        };

        let db = fjall::Database::builder(path).open().map_err(open_failed)?;
        let data = db
            .keyspace(DATA_KEYSPACE, KeyspaceCreateOptions::default)
            .map_err(open_failed)?;

        Ok(Self {
            db,
            data,
            path: path.to_path_buf(),
        })
    }

    /// The filesystem path this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the value stored under `key`, or `None` if the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        trace!(key, "get");
        Ok(self.data.get(key)?.map(|v| v.to_vec()))
    }

    /// Store `value` under `key`, overwriting any previous value.
    ///
    /// The write is persisted before returning.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        trace!(key, len = value.len(), "put");
        self.data.insert(key, value)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    /// Remove the value stored under `key`.
    ///
    /// Removing an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        trace!(key, "delete");
        self.data.remove(key)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    /// List keys in the store, optionally restricted to `prefix` and capped
    /// at `limit` entries.
    pub fn keys(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();

        for kv in self.data.prefix(prefix.unwrap_or("")) {
            let Ok(key_bytes) = kv.key() else {
                continue;
            };
            keys.push(String::from_utf8_lossy(&key_bytes).into_owned());

            if let Some(l) = limit {
                if keys.len() >= l {
                    break;
                }
            }
        }

        Ok(keys)
    }
}

// The engine types are not Debug; show the path that identifies the store.
impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
