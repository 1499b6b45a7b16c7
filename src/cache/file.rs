//! JSON file profile cache.
//!
//! One document holds every category. Each entry stores its profiles as an
//! encoded payload alongside a blake3 digest of that payload; an entry whose
//! digest does not match loads as absent. Writes go to a uniquely named temp
//! file which is fsynced and renamed over the document.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::traits::{normalize_category, CacheEntry, ProfileCache, ProfileSet, StorageError};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    entries: BTreeMap<String, StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    category: String,
    timestamp: DateTime<Utc>,
    /// blake3 hex digest of `payload`.
    digest: String,
    /// JSON-encoded [`ProfileSet`].
    payload: String,
}

impl StoredEntry {
    fn encode(entry: &CacheEntry) -> Result<Self, StorageError> {
        let payload = serde_json::to_string(&entry.profiles)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            category: entry.category.clone(),
            timestamp: entry.timestamp,
            digest: digest(&payload),
            payload,
        })
    }

    /// Decodes the entry, or `None` if the payload is corrupt.
    fn decode(self) -> Option<CacheEntry> {
        if digest(&self.payload) != self.digest {
            warn!(category = %self.category, "cache entry digest mismatch");
            return None;
        }
        match serde_json::from_str::<ProfileSet>(&self.payload) {
            Ok(profiles) => Some(CacheEntry::at(self.category, self.timestamp, profiles)),
            Err(e) => {
                warn!(category = %self.category, error = %e, "cache entry payload undecodable");
                None
            }
        }
    }
}

fn digest(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}

/// File-backed [`ProfileCache`].
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCache {
    /// Creates a cache stored at `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing file is empty; an unparseable one is
    /// treated as empty with a warning.
    fn read_document(&self) -> Result<CacheDocument, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CacheDocument::default()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<CacheDocument>(&bytes) {
            Ok(doc) if doc.version == FORMAT_VERSION => Ok(doc),
            Ok(doc) => {
                warn!(path = %self.path.display(), version = doc.version, "unsupported cache format version");
                Ok(CacheDocument::default())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file is corrupt, ignoring");
                Ok(CacheDocument::default())
            }
        }
    }

    fn write_document(&self, doc: &CacheDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let temp_path = self.path.with_extension(format!("json.tmp.{}", Uuid::new_v4()));
        let result = (|| -> Result<(), StorageError> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl ProfileCache for JsonFileCache {
    fn load(&self, category: &str) -> Result<Option<CacheEntry>, StorageError> {
        let mut doc = self.read_document()?;
        let entry = doc
            .entries
            .remove(&normalize_category(category))
            .and_then(StoredEntry::decode);
        debug!(category, hit = entry.is_some(), "cache load");
        Ok(entry)
    }

    fn save(&self, category: &str, entry: CacheEntry) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock: write_lock".to_string()))?;
        let mut doc = self.read_document()?;
        doc.version = FORMAT_VERSION;
        let profiles = entry.profiles.len();
        doc.entries.insert(normalize_category(category), StoredEntry::encode(&entry)?);
        self.write_document(&doc)?;
        debug!(category, profiles, path = %self.path.display(), "cache save");
        Ok(())
    }

    fn remove(&self, category: &str) -> Result<bool, StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock: write_lock".to_string()))?;
        let mut doc = self.read_document()?;
        let existed = doc.entries.remove(&normalize_category(category)).is_some();
        if existed {
            doc.version = FORMAT_VERSION;
            self.write_document(&doc)?;
        }
        Ok(existed)
    }
}
