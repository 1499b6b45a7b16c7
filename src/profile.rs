//! Canonical attribute profiles.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeKey, TraitKind};
use crate::normalize::Reading;
use crate::range::Interval;

/// Name given to profiles whose taxonomy could not be resolved.
///
/// Profiles carrying this name are extraction failures and must never be
/// ranked as real candidates.
pub const UNKNOWN_SPECIES: &str = "unknown species";

/// Normalized value of one trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum TraitValue {
    Categorical(Reading),
    /// `None` means no range is known.
    Range(Option<Interval>),
}

impl TraitValue {
    /// The "no value" sentinel for a key.
    #[must_use]
    pub const fn missing(key: AttributeKey) -> Self {
        match key.kind() {
            TraitKind::Categorical => Self::Categorical(Reading::Unknown),
            TraitKind::Range => Self::Range(None),
        }
    }

    /// Returns true for the unknown/absent sentinels.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Categorical(Reading::Unknown) | Self::Range(None))
    }

    #[must_use]
    pub const fn as_reading(&self) -> Option<&Reading> {
        match self {
            Self::Categorical(r) => Some(r),
            Self::Range(_) => None,
        }
    }

    #[must_use]
    pub const fn as_interval(&self) -> Option<&Interval> {
        match self {
            Self::Range(Some(iv)) => Some(iv),
            _ => None,
        }
    }
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Categorical(r) => write!(f, "{r}"),
            Self::Range(Some(iv)) => write!(f, "{iv}"),
            Self::Range(None) => write!(f, "unknown"),
        }
    }
}

/// Where a canonical profile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    /// Static local reference table.
    Reference,
    /// Extracted from an external trait database record.
    #[default]
    External,
}

/// A normalized attribute profile for one candidate.
///
/// Built once (by extraction or from a reference row) and not mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    /// Display name, or [`UNKNOWN_SPECIES`].
    pub name: String,
    pub values: BTreeMap<AttributeKey, TraitValue>,
    pub origin: ProfileOrigin,

    /// Free-text description, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CanonicalProfile {
    /// Creates an empty profile with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: ProfileOrigin) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            origin,
            description: None,
        }
    }

    /// Adds a value.
    #[must_use]
    pub fn with_value(mut self, key: AttributeKey, value: TraitValue) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Adds a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Value for a key, or the key's missing sentinel.
    #[must_use]
    pub fn value(&self, key: AttributeKey) -> TraitValue {
        self.values
            .get(&key)
            .cloned()
            .unwrap_or_else(|| TraitValue::missing(key))
    }

    /// False when name resolution failed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        let name = self.name.trim();
        !name.is_empty() && !name.eq_ignore_ascii_case(UNKNOWN_SPECIES)
    }

    /// Number of keys with a known value.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_missing()).count()
    }
}
