//! Value normalization.
//!
//! Free-text lab results and external database values use many spellings for
//! the same outcome. `normalize` folds them into a small vocabulary. It is a
//! total function: anything it does not recognise survives as lowercased
//! trimmed text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::RawValue;

const POSITIVE: &[&str] = &[
    "+",
    "pos",
    "positive",
    "acid",
    "acid production",
    "ferment",
    "fermentation",
    "present",
    "detected",
    "true",
    "yes",
    "ya",
    "positif",
    "+ve",
];

const NEGATIVE: &[&str] = &[
    "-",
    "neg",
    "negative",
    "absent",
    "not detected",
    "false",
    "no",
    "tidak",
    "negatif",
    "-ve",
];

const UNKNOWN: &[&str] = &[
    "?",
    "n/a",
    "na",
    "nan",
    "none",
    "null",
    "unknown",
    "nd",
    "not determined",
];

/// A normalized categorical reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    Positive,
    Negative,
    Variable,
    Unknown,
    /// Unrecognised value, lowercased and trimmed.
    Text(String),
}

impl Reading {
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable)
    }

    /// Canonical text form, as shown in comparison trails.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Variable => "variable",
            Self::Unknown => "unknown",
            Self::Text(t) => t,
        }
    }

    /// Folds several readings of the same trait into one.
    ///
    /// Unknowns are ignored. Agreeing readings collapse to that reading;
    /// positive and negative together (or an explicit variable) collapse to
    /// `Variable`. Disagreeing free text keeps the first value.
    #[must_use]
    pub fn combine<I: IntoIterator<Item = Reading>>(readings: I) -> Self {
        let mut acc = Self::Unknown;
        for reading in readings {
            acc = match (acc, reading) {
                (a, Self::Unknown) => a,
                (Self::Unknown, b) => b,
                (Self::Variable, _) | (_, Self::Variable) => Self::Variable,
                (Self::Positive, Self::Negative) | (Self::Negative, Self::Positive) => {
                    Self::Variable
                }
                (a, _) => a,
            };
        }
        acc
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a raw text value.
///
/// # Examples
///
/// ```
/// use bactident::{normalize, Reading};
///
/// assert_eq!(normalize(Some("+")), Reading::Positive);
/// assert_eq!(normalize(Some(" Negative ")), Reading::Negative);
/// assert_eq!(normalize(Some("+/-")), Reading::Variable);
/// assert_eq!(normalize(None), Reading::Unknown);
/// assert_eq!(normalize(Some("Rods")), Reading::Text("rods".into()));
/// ```
#[must_use]
pub fn normalize(raw: Option<&str>) -> Reading {
    let Some(raw) = raw else {
        return Reading::Unknown;
    };
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return Reading::Unknown;
    }
    if POSITIVE.contains(&value.as_str()) {
        return Reading::Positive;
    }
    if NEGATIVE.contains(&value.as_str()) {
        return Reading::Negative;
    }
    if value.contains("variable") || value.contains("+/-") {
        return Reading::Variable;
    }
    if UNKNOWN.contains(&value.as_str()) {
        return Reading::Unknown;
    }
    Reading::Text(value)
}

/// Normalizes a typed raw scalar. Booleans map to positive/negative;
/// containers and null are unknown.
#[must_use]
pub fn normalize_raw(raw: &RawValue) -> Reading {
    match raw {
        RawValue::Bool(true) => Reading::Positive,
        RawValue::Bool(false) => Reading::Negative,
        other => normalize(other.scalar_text().as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_synonyms() {
        for raw in ["+", "pos", "Positive", "YES", "acid", "Ferment", "present", "Detected", "TRUE", "ya", "positif"] {
            assert_eq!(normalize(Some(raw)), Reading::Positive, "{raw}");
        }
    }

    #[test]
    fn test_negative_synonyms() {
        for raw in ["-", "NEG", "negative", "No", "absent", "not detected", "false", "tidak", "Negatif"] {
            assert_eq!(normalize(Some(raw)), Reading::Negative, "{raw}");
        }
    }

    #[test]
    fn test_variable_patterns() {
        assert_eq!(normalize(Some("variable")), Reading::Variable);
        assert_eq!(normalize(Some("Strain-Variable")), Reading::Variable);
        assert_eq!(normalize(Some("+/-")), Reading::Variable);
        assert_eq!(normalize(Some("weak +/- reaction")), Reading::Variable);
    }

    #[test]
    fn test_unknown_inputs() {
        assert_eq!(normalize(None), Reading::Unknown);
        assert_eq!(normalize(Some("")), Reading::Unknown);
        assert_eq!(normalize(Some("   ")), Reading::Unknown);
        assert_eq!(normalize(Some("?")), Reading::Unknown);
        assert_eq!(normalize(Some("N/A")), Reading::Unknown);
        assert_eq!(normalize(Some("unknown")), Reading::Unknown);
    }

    #[test]
    fn test_free_text_fallback() {
        assert_eq!(normalize(Some("  Coccus ")), Reading::Text("coccus".to_string()));
    }

    #[test]
    fn test_normalize_raw_typed() {
        assert_eq!(normalize_raw(&RawValue::Bool(true)), Reading::Positive);
        assert_eq!(normalize_raw(&RawValue::Bool(false)), Reading::Negative);
        assert_eq!(normalize_raw(&RawValue::Null), Reading::Unknown);
        assert_eq!(normalize_raw(&RawValue::Seq(vec![])), Reading::Unknown);
        assert_eq!(normalize_raw(&RawValue::Int(5)), Reading::Text("5".to_string()));
    }

    #[test]
    fn test_combine_readings() {
        use Reading::{Negative, Positive, Unknown, Variable};
        assert_eq!(Reading::combine(vec![]), Unknown);
        assert_eq!(Reading::combine(vec![Positive, Unknown, Positive]), Positive);
        assert_eq!(Reading::combine(vec![Positive, Negative]), Variable);
        assert_eq!(Reading::combine(vec![Unknown, Negative]), Negative);
        assert_eq!(Reading::combine(vec![Variable, Negative]), Variable);
    }
}
