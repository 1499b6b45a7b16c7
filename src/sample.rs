//! User-entered sample panels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alias::column_alias;
use crate::attribute::AttributeKey;
use crate::value::RawValue;

const LABEL_COLUMNS: &[&str] = &["Sample_Name", "Sampel", "Sample"];
const GENUS_COLUMN: &str = "Genus";

/// Label used when a row has no sample-name column.
pub const UNLABELLED: &str = "unlabelled sample";

/// One sample's raw test results, keyed by attribute.
///
/// Values are kept exactly as entered; normalization happens at scoring
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleInput {
    pub label: String,

    /// Genus hint used to pick which external profiles to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,

    pub values: BTreeMap<AttributeKey, String>,

    /// Columns that were neither metadata nor attribute keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

impl SampleInput {
    /// Creates an empty sample.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            genus: None,
            values: BTreeMap::new(),
            ignored: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_genus(mut self, genus: impl Into<String>) -> Self {
        self.genus = Some(genus.into());
        self
    }

    /// Sets a raw value for a key.
    #[must_use]
    pub fn with_value(mut self, key: AttributeKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Raw value for a key, if entered.
    #[must_use]
    pub fn value(&self, key: AttributeKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Builds a sample from one row of `(column header, cell)` pairs.
    ///
    /// Headers go through column-alias normalization. Blank cells count as
    /// not entered. Unrecognised columns are recorded in `ignored`.
    pub fn from_columns<I, K, V>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut sample = Self::new(UNLABELLED);
        for (header, cell) in columns {
            let header = header.as_ref().trim();
            let cell = cell.as_ref().trim();

            if LABEL_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(header)) {
                if !cell.is_empty() {
                    sample.label = cell.to_string();
                }
                continue;
            }
            if header.eq_ignore_ascii_case(GENUS_COLUMN) {
                if !cell.is_empty() {
                    sample.genus = Some(cell.to_string());
                }
                continue;
            }
            match column_alias(header) {
                Some(key) if !cell.is_empty() => {
                    sample.values.insert(key, cell.to_string());
                }
                Some(_) => {}
                None => sample.ignored.push(header.to_string()),
            }
        }
        if !sample.ignored.is_empty() {
            debug!(
                sample = %sample.label,
                ignored = ?sample.ignored,
                "ignoring unrecognised columns"
            );
        }
        sample
    }

    /// Builds a sample from a raw record (e.g. one JSON object per row).
    /// Returns `None` when the record is not a mapping.
    #[must_use]
    pub fn from_record(record: &RawValue) -> Option<Self> {
        let map = record.as_map()?;
        Some(Self::from_columns(map.iter().map(|(k, v)| {
            (k, v.scalar_text().unwrap_or_default())
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_columns_applies_aliases() {
        let sample = SampleInput::from_columns([
            ("Sample_Name", "S-01"),
            ("Genus", "Bacillus"),
            ("Pewarnaan Gram", "+"),
            ("Katalase", "positif"),
            ("Oxidase", " "),
            ("Colony colour", "cream"),
        ]);
        assert_eq!(sample.label, "S-01");
        assert_eq!(sample.genus.as_deref(), Some("Bacillus"));
        assert_eq!(sample.value(AttributeKey::GramStain), Some("+"));
        assert_eq!(sample.value(AttributeKey::Catalase), Some("positif"));
        assert_eq!(sample.value(AttributeKey::Oxidase), None);
        assert_eq!(sample.ignored, vec!["Colony colour".to_string()]);
    }

    #[test]
    fn test_missing_label_column() {
        let sample = SampleInput::from_columns([("Indol", "-")]);
        assert_eq!(sample.label, UNLABELLED);
        assert!(sample.genus.is_none());
    }

    #[test]
    fn test_from_record_renders_scalars() {
        let record: RawValue = json!({
            "Sampel": "Isolate 7",
            "Temperature_range": 37,
            "Motility": true,
            "Urease": null
        })
        .into();
        let sample = SampleInput::from_record(&record).unwrap();
        assert_eq!(sample.label, "Isolate 7");
        assert_eq!(sample.value(AttributeKey::TemperatureRange), Some("37"));
        assert_eq!(sample.value(AttributeKey::Motility), Some("true"));
        assert_eq!(sample.value(AttributeKey::Urease), None);
        assert!(SampleInput::from_record(&RawValue::from("row")).is_none());
    }
}
