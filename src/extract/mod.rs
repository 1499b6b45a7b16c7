//! Trait extraction: raw external records to canonical profiles.
//!
//! Extraction is a pure function of the raw record and the [`TraitTable`].
//! Every key is resolved independently; a key that cannot be located or
//! parsed gets its missing sentinel and never affects the others.

mod infer;
mod name;
pub mod path;
pub mod table;

pub use name::{accession_label, resolve_name};
pub use path::{parse_path, resolve, resolve_first, Path, Step};
pub use table::{TraitTable, TABLE_VERSION};

use tracing::trace;

use crate::attribute::{AttributeKey, TraitKind};
use crate::normalize::{normalize_raw, Reading};
use crate::profile::{CanonicalProfile, ProfileOrigin, TraitValue};
use crate::range::{parse_range, Interval};
use crate::value::RawValue;

/// Sub-fields that carry the outcome of a test record, in priority order.
const OUTCOME_FIELDS: &[&str] = &[
    "result",
    "test result",
    "activity",
    "growth",
    "ability",
    "utilization",
    "production",
];

/// Sub-fields that never carry an outcome.
const METADATA_FIELDS: &[&str] = &[
    "reference",
    "@ref",
    "ref",
    "method",
    "note",
    "notes",
    "id",
    "ec",
    "metabolite",
];

const MAX_DEPTH: usize = 4;

/// Extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Append a strain designation to resolved names.
    pub include_strain: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_strain: true,
        }
    }
}

/// Converts raw profiles into canonical profiles.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    table: TraitTable,
    options: ExtractOptions,
}

impl Extractor {
    /// Creates an extractor over the given table.
    #[must_use]
    pub const fn new(table: TraitTable, options: ExtractOptions) -> Self {
        Self { table, options }
    }

    /// The key→path table in use.
    #[must_use]
    pub const fn table(&self) -> &TraitTable {
        &self.table
    }

    #[must_use]
    pub const fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Display name of a raw profile, or the unknown-species sentinel.
    #[must_use]
    pub fn name(&self, raw: &RawValue) -> String {
        resolve_name(raw, self.options.include_strain)
    }

    /// Extracts `keys` from `raw`.
    #[must_use]
    pub fn extract(&self, raw: &RawValue, keys: &[AttributeKey]) -> CanonicalProfile {
        let mut profile = CanonicalProfile::new(self.name(raw), ProfileOrigin::External);
        for &key in keys {
            let value = self.extract_value(raw, key);
            if value.is_missing() {
                trace!(key = %key, "no value resolved");
            }
            profile.values.insert(key, value);
        }
        profile
    }

    /// Extracts every known key.
    #[must_use]
    pub fn extract_all(&self, raw: &RawValue) -> CanonicalProfile {
        self.extract(raw, AttributeKey::ALL)
    }

    /// Resolves one key: inference rule first, then the first table path
    /// that resolves.
    #[must_use]
    pub fn extract_value(&self, raw: &RawValue, key: AttributeKey) -> TraitValue {
        let paths = self.table.paths(key);
        if let Some(inferred) = infer::infer(key, raw, paths) {
            if !inferred.is_missing() {
                return inferred;
            }
        }

        let Some(node) = resolve_first(raw, paths) else {
            return TraitValue::missing(key);
        };
        match key.kind() {
            TraitKind::Categorical => TraitValue::Categorical(categorical_reading(node, 0)),
            TraitKind::Range => TraitValue::Range(range_reading(node, 0)),
        }
    }
}

/// Extracts `keys` with the builtin table and default options.
#[must_use]
pub fn extract(raw: &RawValue, keys: &[AttributeKey]) -> CanonicalProfile {
    Extractor::default().extract(raw, keys)
}

/// Candidate sub-fields of a record: outcome fields in priority order, then
/// every other non-metadata field in record order.
fn record_fields(record: &RawValue) -> Vec<&RawValue> {
    let Some(map) = record.as_map() else {
        return Vec::new();
    };
    let mut fields: Vec<&RawValue> = OUTCOME_FIELDS
        .iter()
        .filter_map(|f| map.get(f))
        .filter(|v| !v.is_blank())
        .collect();
    fields.extend(
        map.iter()
            .filter(|(k, v)| {
                let k = k.trim();
                !v.is_blank()
                    && !OUTCOME_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(k))
                    && !METADATA_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(k))
            })
            .map(|(_, v)| v),
    );
    fields
}

fn categorical_reading(node: &RawValue, depth: usize) -> Reading {
    if depth > MAX_DEPTH {
        return Reading::Unknown;
    }
    match node {
        RawValue::Map(_) => record_fields(node)
            .first()
            .map_or(Reading::Unknown, |field| categorical_reading(field, depth + 1)),
        RawValue::Seq(items) => {
            Reading::combine(items.iter().map(|item| categorical_reading(item, depth + 1)))
        }
        scalar => normalize_raw(scalar),
    }
}

fn range_reading(node: &RawValue, depth: usize) -> Option<Interval> {
    if let Some(interval) = parse_range(node) {
        return Some(interval);
    }
    if depth > MAX_DEPTH {
        return None;
    }
    match node {
        RawValue::Map(_) => record_fields(node)
            .into_iter()
            .find_map(|field| range_reading(field, depth + 1)),
        RawValue::Seq(items) => items
            .iter()
            .filter_map(|item| range_reading(item, depth + 1))
            .reduce(|acc, iv| acc.hull(&iv)),
        _ => None,
    }
}
