//! Profile sources: where raw candidate profiles come from.
//!
//! A source returns every raw profile it knows for a category (genus). An
//! empty set means "nothing found"; `Err` is reserved for transport-level
//! failures, which the engine degrades to an empty set.

pub mod bacdive;
#[cfg(feature = "http")]
pub mod http;

use std::collections::HashMap;

use crate::cache::{normalize_category, ProfileSet};
use crate::error::FetchError;
use crate::value::RawValue;

#[cfg(feature = "http")]
pub use http::{BacDiveConfig, BacDiveSource};

/// Supplier of raw profiles per category.
pub trait ProfileSource: Send + Sync {
    /// Fetches the raw profiles for `category`.
    ///
    /// # Errors
    /// Returns a [`FetchError`] only for transport failures; "not found" is
    /// an empty set.
    fn fetch_profiles(&self, category: &str) -> Result<ProfileSet, FetchError>;
}

/// In-memory profile source.
#[derive(Debug, Clone, Default)]
pub struct StaticProfileSource {
    by_category: HashMap<String, ProfileSet>,
    fallback: Option<ProfileSet>,
}

impl StaticProfileSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that returns `profiles` for every category.
    #[must_use]
    pub fn uniform(profiles: ProfileSet) -> Self {
        Self {
            by_category: HashMap::new(),
            fallback: Some(profiles),
        }
    }

    /// Registers the profiles for one category.
    #[must_use]
    pub fn with_category(mut self, category: &str, profiles: ProfileSet) -> Self {
        self.by_category.insert(normalize_category(category), profiles);
        self
    }

    /// Builds a uniform source from a JSON document mapping candidate ID to
    /// raw profile, in any of the shapes the BacDive API returns.
    ///
    /// # Errors
    /// Returns `FetchError::Decode` if the text is not JSON.
    pub fn from_json_str(text: &str) -> Result<Self, FetchError> {
        let raw: RawValue = serde_json::from_str(text).map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })?;
        Ok(Self::uniform(bacdive::profiles_from_response(&raw)))
    }
}

impl ProfileSource for StaticProfileSource {
    fn fetch_profiles(&self, category: &str) -> Result<ProfileSet, FetchError> {
        Ok(self
            .by_category
            .get(&normalize_category(category))
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_default())
    }
}
