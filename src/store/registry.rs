//! Registry of open storage instances, keyed by filesystem path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::logging::{debug, info, warn};

use super::error::StoreError;
use super::handle::StoreHandle;

/// Tracks which filesystem paths currently have an open storage instance.
///
/// The registry is an explicitly owned object: construct one at process start
/// and hand it (by reference, or by pointer across the C boundary) to every
/// caller. All operations serialize on a single mutex guarding the path map,
/// so the registry may be shared freely between threads.
///
/// Paths key the map byte-for-byte; no canonicalization is performed.
/// Distinct spellings of the same directory are the caller's responsibility
/// (the engine's own filesystem lock still refuses a true double open).
///
/// # Example
///
/// ```ignore
/// use kv_registry::StoreRegistry;
///
/// let registry = StoreRegistry::new();
/// let store = registry.open("/var/lib/app/store-a")?;
/// store.put("greeting", b"hello")?;
/// registry.close("/var/lib/app/store-a")?;
/// ```
#[derive(Debug)]
pub struct StoreRegistry {
    stores: Mutex<HashMap<PathBuf, Arc<StoreHandle>>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry and open every store listed in `config`.
    ///
    /// Fails on the first store that cannot be opened; stores opened before
    /// the failure are released again when the partial registry drops.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let registry = Self::new();

        for store in &config.stores {
            registry.open(&store.path)?;
        }

        Ok(registry)
    }

    /// Create a registry from the TOML configuration file at `path`.
    pub fn from_config_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let config = Config::from_file(path)?;
        let registry = Self::from_config(&config)?;
        Ok(registry)
    }

    /// Open the store at `path`, registering its handle, and return the
    /// handle.
    ///
    /// Opening a path that is already registered is idempotent: the existing
    /// handle is returned and no second physical open takes place. A failed
    /// open leaves the registry unchanged.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Arc<StoreHandle>, StoreError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidPath("path must not be empty".to_string()));
        }

        let mut stores = self.lock();

        if let Some(handle) = stores.get(path) {
            debug!(path = %path.display(), "store already open, reusing handle");
            return Ok(Arc::clone(handle));
        }

        // The lock is held across the physical open: concurrent opens of the
        // same path collapse into a single engine open, and the engine's
        // on-disk lock is never contended from within one process.
        let handle = Arc::new(StoreHandle::open(path)?);
        stores.insert(path.to_path_buf(), Arc::clone(&handle));
        info!(path = %path.display(), "opened store");

        Ok(handle)
    }

    /// Close the store at `path`, removing it from the registry.
    ///
    /// Fails with [`StoreError::NotOpen`] if no store is registered for
    /// `path`; a failed close leaves the registry unchanged. The engine
    /// releases the store's resources when the last outstanding handle clone
    /// is dropped, which is immediate unless the caller retained one.
    pub fn close(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();

        let handle = {
            let mut stores = self.lock();
            stores
                .remove(path)
                .ok_or_else(|| StoreError::NotOpen(path.display().to_string()))?
        };

        if Arc::strong_count(&handle) > 1 {
            warn!(path = %path.display(), "store closed while handles are still outstanding");
        }

        // Dropped outside the lock: releasing the engine can flush to disk.
        drop(handle);
        info!(path = %path.display(), "closed store");

        Ok(())
    }

    /// Get the handle for the open store at `path`.
    ///
    /// Fails with [`StoreError::NotOpen`] if no store is registered for
    /// `path`. The handle is cloned out under the lock; engine I/O performed
    /// on it never blocks registry operations.
    pub fn handle(&self, path: impl AsRef<Path>) -> Result<Arc<StoreHandle>, StoreError> {
        let path = path.as_ref();
        self.lock()
            .get(path)
            .map(Arc::clone)
            .ok_or_else(|| StoreError::NotOpen(path.display().to_string()))
    }

    /// Report whether a store is currently registered for `path`.
    ///
    /// Never has side effects.
    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        self.lock().contains_key(path.as_ref())
    }

    /// Paths of all currently open stores, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of currently open stores.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Report whether no stores are open.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Close every open store, returning how many were closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut stores = self.lock();
            stores.drain().collect()
        };
        let count = drained.len();

        // Handles drop here, outside the lock.
        drop(drained);
        if count > 0 {
            info!(count, "closed all stores");
        }

        count
    }

    // A poisoned lock only means another thread panicked mid-operation; the
    // map itself is never left inconsistent (insert happens after a
    // successful open, remove is atomic), so recover the guard.
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<StoreHandle>>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
