//! # bactident - bacterial identification by weighted trait matching
//!
//! bactident identifies a bacterial sample from its biochemical and
//! physiological test panel. The sample is scored against canonical profiles
//! of candidate species, either from a static reference table or extracted
//! from BacDive-style strain records, and the candidates are ranked by
//! weighted similarity.
//!
//! ## Core Concepts
//!
//! - **AttributeKey**: one test (Gram stain, catalase, growth temperature...)
//! - **RawValue**: an unprocessed, arbitrarily nested external record
//! - **CanonicalProfile**: the normalized trait values of one candidate
//! - **WeightProfile**: how much each attribute counts when scoring
//! - **ScoredCandidate**: one ranked identification with its comparison trail
//!
//! ## Usage
//!
//! ```
//! use bactident::{
//!     rank_candidates, AttributeKey, RankOptions, ReferenceTable, SampleInput, WeightPreset,
//! };
//!
//! let sample = SampleInput::new("isolate 7")
//!     .with_value(AttributeKey::GramStain, "+")
//!     .with_value(AttributeKey::Catalase, "positive")
//!     .with_value(AttributeKey::DNase, "+");
//!
//! let ranked = rank_candidates(
//!     &sample,
//!     &ReferenceTable::builtin().candidates(),
//!     &WeightPreset::Standard.profile(),
//!     &RankOptions::default(),
//! );
//! assert_eq!(ranked[0].name, "Staphylococcus aureus");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod attribute;
pub mod error;
pub mod normalize;
pub mod profile;
pub mod range;
pub mod value;

// Extraction and scoring
pub mod alias;
pub mod extract;
pub mod rank;
pub mod reference;
pub mod sample;
pub mod score;

// Collaborators and orchestration
pub mod cache;
pub mod config;
pub mod engine;
pub mod fetch;

// Re-export primary types at crate root for convenience
pub use alias::{column_alias, normalize_columns};
pub use attribute::{AttributeKey, TraitKind, Weight, WeightPreset, WeightProfile};
pub use error::{FetchError, IdentError, IdentResult, ValidationError};
pub use normalize::{normalize, Reading};
pub use profile::{CanonicalProfile, ProfileOrigin, TraitValue, UNKNOWN_SPECIES};
pub use range::{parse_range, Interval};
pub use value::RawValue;

pub use extract::{extract, ExtractOptions, Extractor, TraitTable};
pub use rank::{rank_candidates, RankOptions, ScoredCandidate, ZeroScorePolicy};
pub use reference::{ReferenceEntry, ReferenceTable};
pub use sample::SampleInput;
pub use score::{score, ComparisonDetail, ConfidenceBand, Similarity, Verdict};

pub use cache::{is_reusable, CacheDecision, CacheEntry, CacheGate, ProfileCache, ProfileSet, StorageError};
pub use config::IdentifyConfig;
pub use engine::{IdentificationEngine, SampleResult};
pub use fetch::{ProfileSource, StaticProfileSource};
