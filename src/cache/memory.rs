//! In-memory profile cache.
//!
//! Thread-safe and process-local. Used in tests and by callers that do not
//! need persistence across runs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::cache::traits::{normalize_category, CacheEntry, ProfileCache, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// In-memory [`ProfileCache`].
#[derive(Debug, Default)]
pub struct InMemoryProfileCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryProfileCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored categories.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries.read().map_err(|_| lock_err("entries"))?.len())
    }

    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl ProfileCache for InMemoryProfileCache {
    fn load(&self, category: &str) -> Result<Option<CacheEntry>, StorageError> {
        let entries = self.entries.read().map_err(|_| lock_err("entries"))?;
        Ok(entries.get(&normalize_category(category)).cloned())
    }

    fn save(&self, category: &str, entry: CacheEntry) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| lock_err("entries"))?;
        entries.insert(normalize_category(category), entry);
        Ok(())
    }

    fn remove(&self, category: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.write().map_err(|_| lock_err("entries"))?;
        Ok(entries.remove(&normalize_category(category)).is_some())
    }
}
