//! Cache reuse decisions.
//!
//! The single place that decides whether a cached entry may be trusted.
//! Anything stale, empty, or produced by a failed fetch is a miss.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::traits::CacheEntry;
use crate::extract::resolve_name;
use crate::profile::UNKNOWN_SPECIES;

/// Default freshness window: 24 hours.
pub const DEFAULT_FRESHNESS_SECS: i64 = 24 * 60 * 60;

/// Why a cache entry was or was not reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDecision {
    /// Entry is fresh and sane.
    Reuse,
    /// No entry stored.
    Missing,
    /// Entry is at least as old as the freshness window.
    Stale {
        age_secs: i64,
    },
    /// Entry holds no profiles.
    Empty,
    /// The sampled profile has no resolvable name.
    Unresolved,
}

impl CacheDecision {
    #[must_use]
    pub const fn is_reuse(&self) -> bool {
        matches!(self, Self::Reuse)
    }
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse => f.write_str("reuse"),
            Self::Missing => f.write_str("missing"),
            Self::Stale { age_secs } => write!(f, "stale ({age_secs}s old)"),
            Self::Empty => f.write_str("empty"),
            Self::Unresolved => f.write_str("unresolved profile name"),
        }
    }
}

/// Freshness and sanity gate for cached profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGate {
    freshness: Duration,
}

impl CacheGate {
    /// Creates a gate with the given freshness window.
    #[must_use]
    pub const fn new(freshness: Duration) -> Self {
        Self { freshness }
    }

    /// Creates a gate from a window in seconds.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::seconds(i64::from(u32::try_from(secs).unwrap_or(u32::MAX))))
    }

    #[must_use]
    pub const fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Decides whether `entry` may be reused at `now`.
    #[must_use]
    pub fn decide(&self, entry: Option<&CacheEntry>, now: DateTime<Utc>) -> CacheDecision {
        let Some(entry) = entry else {
            return CacheDecision::Missing;
        };
        let age = entry.age(now);
        if age >= self.freshness {
            return CacheDecision::Stale {
                age_secs: age.num_seconds(),
            };
        }
        let Some((_, first)) = entry.profiles.first() else {
            return CacheDecision::Empty;
        };
        let name = resolve_name(first, false);
        if name.trim().is_empty() || name.eq_ignore_ascii_case(UNKNOWN_SPECIES) {
            return CacheDecision::Unresolved;
        }
        CacheDecision::Reuse
    }

    /// Boolean projection of [`Self::decide`].
    #[must_use]
    pub fn is_reusable(&self, entry: Option<&CacheEntry>, now: DateTime<Utc>) -> bool {
        self.decide(entry, now).is_reuse()
    }
}

impl Default for CacheGate {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_FRESHNESS_SECS))
    }
}

/// [`CacheGate::is_reusable`] with the default 24-hour window.
#[must_use]
pub fn is_reusable(entry: Option<&CacheEntry>, now: DateTime<Utc>) -> bool {
    CacheGate::default().is_reusable(entry, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::traits::ProfileSet;
    use crate::value::RawValue;
    use serde_json::json;

    fn named_profiles() -> ProfileSet {
        let mut set = ProfileSet::new();
        set.insert(
            "1",
            json!({"Name and taxonomic classification": {"genus": "Bacillus", "species": "Bacillus cereus"}}).into(),
        );
        set
    }

    fn unnamed_profiles() -> ProfileSet {
        let mut set = ProfileSet::new();
        set.insert("1", json!({"Morphology": {"cell morphology": {"motility": "yes"}}}).into());
        set
    }

    #[test]
    fn test_missing_entry() {
        assert_eq!(CacheGate::default().decide(None, Utc::now()), CacheDecision::Missing);
        assert!(!is_reusable(None, Utc::now()));
    }

    #[test]
    fn test_fresh_named_entry_is_reused() {
        let now = Utc::now();
        let entry = CacheEntry::at("Bacillus", now - Duration::hours(1), named_profiles());
        assert_eq!(CacheGate::default().decide(Some(&entry), now), CacheDecision::Reuse);
        assert!(is_reusable(Some(&entry), now));
    }

    #[test]
    fn test_stale_entry_rejected_regardless_of_content() {
        let now = Utc::now();
        let entry = CacheEntry::at("Bacillus", now - Duration::hours(25), named_profiles());
        assert_eq!(
            CacheGate::default().decide(Some(&entry), now),
            CacheDecision::Stale { age_secs: 25 * 3600 }
        );
    }

    #[test]
    fn test_window_boundary_is_stale() {
        let now = Utc::now();
        let entry = CacheEntry::at("Bacillus", now - Duration::hours(24), named_profiles());
        assert!(!is_reusable(Some(&entry), now));
    }

    #[test]
    fn test_unknown_species_rejected() {
        let now = Utc::now();
        let entry = CacheEntry::at("Bacillus", now - Duration::hours(1), unnamed_profiles());
        assert_eq!(CacheGate::default().decide(Some(&entry), now), CacheDecision::Unresolved);
    }

    #[test]
    fn test_empty_entry_rejected() {
        let now = Utc::now();
        let entry = CacheEntry::at("Bacillus", now, ProfileSet::new());
        assert_eq!(CacheGate::default().decide(Some(&entry), now), CacheDecision::Empty);
    }

    #[test]
    fn test_only_first_profile_is_sampled() {
        let now = Utc::now();
        let mut set = ProfileSet::new();
        set.insert("9", RawValue::Seq(Vec::new()));
        set.insert("10", json!({"General": {"BacDive-ID": 10}}).into());
        // Only the first profile is sampled.
        let entry = CacheEntry::at("Bacillus", now, set);
        assert_eq!(CacheGate::default().decide(Some(&entry), now), CacheDecision::Unresolved);
    }

    #[test]
    fn test_custom_window() {
        let now = Utc::now();
        let gate = CacheGate::from_secs(60);
        let entry = CacheEntry::at("Bacillus", now - Duration::seconds(90), named_profiles());
        assert!(!gate.is_reusable(Some(&entry), now));
        assert_eq!(gate.freshness(), Duration::seconds(60));
    }
}
