//! Identification engine.
//!
//! Ties the pipeline together: cache-gated profile loading, extraction,
//! ranking. Fetch and cache failures never abort an identification; they
//! degrade to "no candidates" with a warning.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attribute::{AttributeKey, WeightProfile};
use crate::cache::{normalize_category, CacheDecision, CacheEntry, CacheGate, ProfileCache, ProfileSet};
use crate::config::IdentifyConfig;
use crate::error::{IdentError, IdentResult, ValidationError};
use crate::extract::{Extractor, TraitTable};
use crate::fetch::ProfileSource;
use crate::profile::CanonicalProfile;
use crate::rank::{rank_candidates, RankOptions, ScoredCandidate};
use crate::reference::ReferenceTable;
use crate::sample::SampleInput;

/// Ranked candidates for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,
    pub candidates: Vec<ScoredCandidate>,
}

impl SampleResult {
    /// Best-ranked candidate, if any.
    #[must_use]
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }
}

/// Identification engine over a profile source and an optional cache.
#[derive(Clone)]
pub struct IdentificationEngine {
    source: Arc<dyn ProfileSource>,
    cache: Option<Arc<dyn ProfileCache>>,
    gate: CacheGate,
    extractor: Extractor,
    weights: Arc<RwLock<WeightProfile>>,
    rank_options: RankOptions,
}

impl std::fmt::Debug for IdentificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentificationEngine")
            .field("cached", &self.cache.is_some())
            .field("gate", &self.gate)
            .field("extractor", &self.extractor)
            .field("rank_options", &self.rank_options)
            .finish_non_exhaustive()
    }
}

impl IdentificationEngine {
    /// Creates an engine with default weights, ranking and no cache.
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        Self {
            source,
            cache: None,
            gate: CacheGate::default(),
            extractor: Extractor::default(),
            weights: Arc::new(RwLock::new(WeightProfile::default())),
            rank_options: RankOptions::default(),
        }
    }

    /// Creates an engine configured from `config`. The cache backend is
    /// attached separately with [`Self::with_cache`].
    ///
    /// # Errors
    /// Returns a validation error if `config` is invalid.
    pub fn from_config(source: Arc<dyn ProfileSource>, config: &IdentifyConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::new(source)
            .with_weights(config.weight_profile()?)
            .with_gate(config.cache_gate())
            .with_rank_options(config.rank_options())
            .with_extractor(Extractor::new(TraitTable::builtin(), config.extract_options())))
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ProfileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub const fn with_gate(mut self, gate: CacheGate) -> Self {
        self.gate = gate;
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_weights(self, weights: WeightProfile) -> Self {
        Self {
            weights: Arc::new(RwLock::new(weights)),
            ..self
        }
    }

    #[must_use]
    pub const fn with_rank_options(mut self, options: RankOptions) -> Self {
        self.rank_options = options;
        self
    }

    #[must_use]
    pub const fn rank_options(&self) -> &RankOptions {
        &self.rank_options
    }

    /// Current weight table.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn weights(&self) -> IdentResult<WeightProfile> {
        self.weights
            .read()
            .map(|w| w.clone())
            .map_err(|_| IdentError::internal("poisoned lock: weights"))
    }

    /// Replaces the weight table. Subsequent identifications use it; clones
    /// of this engine share the table.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn set_weights(&self, weights: WeightProfile) -> IdentResult<()> {
        let mut guard = self
            .weights
            .write()
            .map_err(|_| IdentError::internal("poisoned lock: weights"))?;
        *guard = weights;
        Ok(())
    }

    /// Raw profiles for `genus`, from the cache when the gate allows it and
    /// from the source otherwise.
    #[must_use]
    pub fn load_profiles(&self, genus: &str) -> ProfileSet {
        self.load_profiles_at(genus, Utc::now())
    }

    /// [`Self::load_profiles`] with an explicit clock.
    #[must_use]
    pub fn load_profiles_at(&self, genus: &str, now: DateTime<Utc>) -> ProfileSet {
        let genus = genus.trim();
        let cached = self.cache.as_ref().and_then(|cache| match cache.load(genus) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(genus, error = %e, "cache load failed");
                None
            }
        });

        let decision = self.gate.decide(cached.as_ref(), now);
        if let (CacheDecision::Reuse, Some(entry)) = (decision, cached) {
            debug!(genus, profiles = entry.profiles.len(), "reusing cached profiles");
            return entry.profiles;
        }
        if self.cache.is_some() {
            info!(genus, reason = %decision, "refetching profiles");
        }

        let profiles = match self.source.fetch_profiles(genus) {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(genus, error = %e, "fetch failed, continuing without candidates");
                return ProfileSet::new();
            }
        };

        if let Some(cache) = &self.cache {
            if !profiles.is_empty() {
                let entry = CacheEntry::at(genus, now, profiles.clone());
                if let Err(e) = cache.save(genus, entry) {
                    warn!(genus, error = %e, "cache save failed");
                }
            }
        }
        profiles
    }

    /// Canonical candidate profiles for `genus`. Profiles whose species name
    /// cannot be resolved are dropped.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn candidates(&self, genus: &str) -> IdentResult<Vec<(String, CanonicalProfile)>> {
        let weights = self.weights()?;
        Ok(self.extract_candidates(&self.load_profiles(genus), &weights))
    }

    fn extract_candidates(&self, profiles: &ProfileSet, weights: &WeightProfile) -> Vec<(String, CanonicalProfile)> {
        let keys: Vec<AttributeKey> = weights.iter().map(|(key, _)| key).collect();
        let raw: Vec<(&str, _)> = profiles.iter().collect();
        let extract_one = |&(id, profile): &(&str, _)| {
            let canonical = self.extractor.extract(profile, &keys);
            if canonical.is_resolved() {
                Some((id.to_string(), canonical))
            } else {
                debug!(candidate = id, "dropping profile with unknown species");
                None
            }
        };
        let extracted: Vec<Option<(String, CanonicalProfile)>> = if self.rank_options.parallel {
            raw.par_iter().map(extract_one).collect()
        } else {
            raw.iter().map(extract_one).collect()
        };
        let candidates: Vec<_> = extracted.into_iter().flatten().collect();
        if candidates.len() < profiles.len() {
            info!(
                profiles = profiles.len(),
                candidates = candidates.len(),
                "some profiles had no resolvable species name"
            );
        }
        candidates
    }

    /// Identifies `sample` against the external profiles for `genus`.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn identify(&self, sample: &SampleInput, genus: &str) -> IdentResult<Vec<ScoredCandidate>> {
        let weights = self.weights()?;
        let candidates = self.extract_candidates(&self.load_profiles(genus), &weights);
        Ok(rank_candidates(sample, &candidates, &weights, &self.rank_options))
    }

    /// Identifies `sample` against a static reference table.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn identify_reference(&self, sample: &SampleInput, table: &ReferenceTable) -> IdentResult<Vec<ScoredCandidate>> {
        let weights = self.weights()?;
        Ok(rank_candidates(sample, &table.candidates(), &weights, &self.rank_options))
    }

    /// Identifies several samples, each against the profiles of its own
    /// genus. Profiles are loaded once per distinct genus; samples without a
    /// genus get no candidates.
    ///
    /// # Errors
    /// Returns `Internal` if the weight lock is poisoned.
    pub fn identify_batch(&self, samples: &[SampleInput]) -> IdentResult<Vec<SampleResult>> {
        let weights = self.weights()?;

        let mut by_genus: BTreeMap<String, Vec<(String, CanonicalProfile)>> = BTreeMap::new();
        for genus in samples.iter().filter_map(|s| s.genus.as_deref()) {
            let genus = genus.trim();
            let key = normalize_category(genus);
            if key.is_empty() || by_genus.contains_key(&key) {
                continue;
            }
            let candidates = self.extract_candidates(&self.load_profiles(genus), &weights);
            by_genus.insert(key, candidates);
        }

        // Each sample ranks serially; parallelism is across samples.
        let options = RankOptions {
            parallel: false,
            ..self.rank_options
        };
        let rank_one = |sample: &SampleInput| {
            let genus = sample.genus.as_deref().map(str::trim).filter(|g| !g.is_empty());
            let candidates = match genus.and_then(|g| by_genus.get(&normalize_category(g))) {
                Some(candidates) => rank_candidates(sample, candidates, &weights, &options),
                None => {
                    warn!(sample = %sample.label, "sample has no genus, skipping");
                    Vec::new()
                }
            };
            SampleResult {
                label: sample.label.clone(),
                genus: genus.map(str::to_string),
                candidates,
            }
        };

        Ok(if self.rank_options.parallel {
            samples.par_iter().map(rank_one).collect()
        } else {
            samples.iter().map(rank_one).collect()
        })
    }
}
