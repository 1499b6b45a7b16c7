//! Identification configuration.
//!
//! Every section is optional in TOML; missing fields take their defaults.
//!
//! ```toml
//! [cache]
//! freshness_secs = 86400
//! path = "bacdive_cache.json"
//!
//! [ranking]
//! zero_scores = "drop"
//! max_results = 10
//!
//! [weights]
//! preset = "biochemical"
//! overrides = { Catalase = 2 }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeKey, WeightPreset, WeightProfile};
use crate::cache::{CacheGate, DEFAULT_FRESHNESS_SECS};
use crate::error::ValidationError;
use crate::extract::ExtractOptions;
use crate::rank::{RankOptions, ZeroScorePolicy};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    pub cache: CacheConfig,
    pub ranking: RankingConfig,
    pub extraction: ExtractionConfig,
    pub weights: WeightsConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cached profiles older than this are refetched.
    pub freshness_secs: u64,
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: DEFAULT_FRESHNESS_SECS.unsigned_abs(),
            path: PathBuf::from("bacdive_cache.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub zero_scores: ZeroScorePolicy,
    pub parallel: bool,
    pub max_results: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        let options = RankOptions::default();
        Self {
            zero_scores: options.zero_scores,
            parallel: options.parallel,
            max_results: options.max_results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Append the strain designation to resolved species names.
    pub include_strain: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_strain: ExtractOptions::default().include_strain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Preset name; see [`WeightPreset`].
    pub preset: String,
    /// Per-attribute weights applied on top of the preset.
    pub overrides: BTreeMap<String, u8>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            preset: "standard".to_string(),
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Cap on strain IDs fetched per genus.
    pub max_profiles: usize,
    /// IDs per retrieve call.
    pub batch_size: usize,
    pub bearer_token: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bacdive.dsmz.de".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            max_profiles: 200,
            batch_size: 100,
            bearer_token: None,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connection settings for the live BacDive source.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn bacdive(&self) -> crate::fetch::BacDiveConfig {
        crate::fetch::BacDiveConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout(),
            max_retries: self.max_retries,
            max_profiles: self.max_profiles,
            batch_size: self.batch_size,
            bearer_token: self.bearer_token.clone(),
            ..crate::fetch::BacDiveConfig::default()
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl IdentifyConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for TOML that does not parse, plus anything
    /// [`IdentifyConfig::validate`] rejects.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        let config: Self = toml::from_str(text).map_err(|e| invalid("<toml>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| invalid("<file>", format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks field ranges and resolves the weight table once.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache.freshness_secs == 0 {
            return Err(invalid("cache.freshness_secs", "must be greater than zero"));
        }
        if self.fetch.batch_size == 0 {
            return Err(invalid("fetch.batch_size", "must be greater than zero"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(invalid("fetch.timeout_secs", "must be greater than zero"));
        }
        if self.ranking.max_results == Some(0) {
            return Err(invalid("ranking.max_results", "must be greater than zero when set"));
        }
        self.weight_profile().map(|_| ())
    }

    /// The preset with overrides applied.
    ///
    /// # Errors
    /// Returns `UnknownPreset`, `UnknownAttribute` or `WeightOutOfRange`.
    pub fn weight_profile(&self) -> Result<WeightProfile, ValidationError> {
        let mut profile = self.weights.preset.parse::<WeightPreset>()?.profile();
        for (name, &weight) in &self.weights.overrides {
            let key: AttributeKey = name.parse()?;
            profile = profile.with_weight(key, weight)?;
        }
        Ok(profile)
    }

    #[must_use]
    pub const fn rank_options(&self) -> RankOptions {
        RankOptions {
            zero_scores: self.ranking.zero_scores,
            parallel: self.ranking.parallel,
            max_results: self.ranking.max_results,
        }
    }

    #[must_use]
    pub const fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_strain: self.extraction.include_strain,
        }
    }

    #[must_use]
    pub fn cache_gate(&self) -> CacheGate {
        CacheGate::from_secs(self.cache.freshness_secs)
    }
}
