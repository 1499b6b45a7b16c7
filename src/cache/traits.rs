//! Profile cache contract.
//!
//! The cache stores raw fetched profiles per category (genus). Reuse
//! decisions belong to [`crate::cache::CacheGate`]; backends only store and
//! return entries.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::value::RawValue;

/// Errors that can occur in cache backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend error.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Candidate ID → raw profile, in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet(Vec<(String, RawValue)>);

impl ProfileSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts a profile, replacing an existing one with the same ID in place.
    pub fn insert(&mut self, id: impl Into<String>, profile: RawValue) {
        let id = id.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == id) {
            slot.1 = profile;
        } else {
            self.0.push((id, profile));
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RawValue> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// First profile in fetch order.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &RawValue)> {
        self.0.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Truncates to the first `n` profiles.
    pub fn truncate(&mut self, n: usize) {
        self.0.truncate(n);
    }
}

impl FromIterator<(String, RawValue)> for ProfileSet {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (id, profile) in iter {
            set.insert(id, profile);
        }
        set
    }
}

impl IntoIterator for ProfileSet {
    type Item = (String, RawValue);
    type IntoIter = std::vec::IntoIter<(String, RawValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Serialize for ProfileSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, profile) in &self.0 {
            map.serialize_entry(id, profile)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProfileSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfileSetVisitor;

        impl<'de> Visitor<'de> for ProfileSetVisitor {
            type Value = ProfileSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of candidate ID to profile")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = ProfileSet::new();
                while let Some((id, profile)) = access.next_entry::<String, RawValue>()? {
                    set.insert(id, profile);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ProfileSetVisitor)
    }
}

/// Raw profiles fetched for one category at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Category key (genus) the profiles were fetched for.
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub profiles: ProfileSet,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(category: impl Into<String>, profiles: ProfileSet) -> Self {
        Self::at(category, Utc::now(), profiles)
    }

    /// Creates an entry with an explicit timestamp.
    #[must_use]
    pub fn at(category: impl Into<String>, timestamp: DateTime<Utc>, profiles: ProfileSet) -> Self {
        Self {
            category: category.into(),
            timestamp,
            profiles,
        }
    }

    /// Age of the entry at `now`. Negative for entries from the future.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }
}

/// Storage backend for fetched profiles.
///
/// Category keys are compared trimmed and case-insensitively.
pub trait ProfileCache: Send + Sync {
    /// Loads the entry for a category, if one is stored.
    fn load(&self, category: &str) -> Result<Option<CacheEntry>, StorageError>;

    /// Stores an entry, replacing any previous entry for the category.
    fn save(&self, category: &str, entry: CacheEntry) -> Result<(), StorageError>;

    /// Removes the entry for a category. Returns whether one existed.
    fn remove(&self, category: &str) -> Result<bool, StorageError>;
}

/// Canonical form of a category key: trimmed and lowercased.
#[must_use]
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}
