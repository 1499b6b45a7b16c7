//! Attribute keys and weight tables.
//!
//! An `AttributeKey` names one biochemical or physiological test. Every key
//! scored by the engine carries an integer weight reflecting its diagnostic
//! importance; weights live in a `WeightProfile` passed explicitly into the
//! scorer at call time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// How a trait's values are represented and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    /// positive / negative / variable / unknown (or free text).
    Categorical,
    /// A numeric `(min, max)` interval.
    Range,
}

macro_rules! attribute_keys {
    ($($variant:ident => $name:literal, $kind:ident;)+) => {
        /// One biochemical or physiological trait used for identification.
        ///
        /// Declaration order is the canonical iteration order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AttributeKey {
            $(
                #[doc = $name]
                $variant,
            )+
        }

        impl AttributeKey {
            /// All keys, in canonical order.
            pub const ALL: &'static [AttributeKey] = &[$(AttributeKey::$variant),+];

            /// Canonical column name of this key.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(AttributeKey::$variant => $name,)+
                }
            }

            /// Whether values of this key are categorical or numeric ranges.
            #[must_use]
            pub const fn kind(self) -> TraitKind {
                match self {
                    $(AttributeKey::$variant => TraitKind::$kind,)+
                }
            }
        }
    };
}

attribute_keys! {
    GramStain => "Gram_stain", Categorical;
    Motility => "Motility", Categorical;
    Catalase => "Catalase", Categorical;
    Oxidase => "Oxidase", Categorical;
    Urease => "Urease", Categorical;
    DNase => "DNase", Categorical;
    Gelatinase => "Gelatinase", Categorical;
    Indole => "Indole", Categorical;
    MethylRed => "MR", Categorical;
    VogesProskauer => "VP", Categorical;
    Citrate => "Citrate", Categorical;
    LysineDecarboxylase => "Lysine_decarboxylase", Categorical;
    OrnithineDecarboxylase => "Ornithine_decarboxylase", Categorical;
    ArginineDihydrolase => "Arginine_dihydrolase", Categorical;
    NitrateReduction => "Nitrate_reduction", Categorical;
    H2sProduction => "H2S_production", Categorical;
    EsculinHydrolysis => "Esculin_hydrolysis", Categorical;
    Glucose => "Glucose", Categorical;
    Lactose => "Lactose", Categorical;
    Sucrose => "Sucrose", Categorical;
    Mannitol => "Mannitol", Categorical;
    Sorbitol => "Sorbitol", Categorical;
    Xylose => "Xylose", Categorical;
    Arabinose => "Arabinose", Categorical;
    Trehalose => "Trehalose", Categorical;
    Inositol => "Inositol", Categorical;
    Maltose => "Maltose", Categorical;
    Raffinose => "Raffinose", Categorical;
    Fructose => "Fructose", Categorical;
    NaclTolerance => "NaCl_tolerance", Range;
    TemperatureRange => "Temperature_range", Range;
    PhRange => "pH_range", Range;
}

impl AttributeKey {
    /// Returns true for range-typed keys.
    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(self.kind(), TraitKind::Range)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKey {
    type Err = ValidationError;

    /// Parses a canonical key name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::UnknownAttribute {
                name: needle.to_string(),
            })
    }
}

impl Serialize for AttributeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AttributeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Diagnostic importance multiplier.
pub type Weight = u8;

/// Largest permitted weight.
pub const MAX_WEIGHT: Weight = 3;

/// Named weight presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPreset {
    /// Key enzymes 3, classic biochemical tests 2, sugars and ranges 1.
    #[default]
    Standard,
    /// Every key weighs 1.
    Uniform,
    /// Enzymes and biochemical tests 3, sugars 1, growth ranges ignored.
    Biochemical,
}

impl WeightPreset {
    /// Returns a short stable identifier suitable for logging/config.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Uniform => "uniform",
            Self::Biochemical => "biochemical",
        }
    }

    /// Builds the weight table for this preset.
    #[must_use]
    pub fn profile(self) -> WeightProfile {
        let entries = AttributeKey::ALL
            .iter()
            .map(|&key| (key, self.weight_for(key)))
            .collect();
        WeightProfile { entries }
    }

    fn weight_for(self, key: AttributeKey) -> Weight {
        use AttributeKey as K;

        match self {
            Self::Uniform => 1,
            Self::Standard => match key {
                K::GramStain
                | K::Motility
                | K::Catalase
                | K::Oxidase
                | K::Urease
                | K::DNase
                | K::Gelatinase => 3,
                K::Indole
                | K::MethylRed
                | K::VogesProskauer
                | K::Citrate
                | K::LysineDecarboxylase
                | K::OrnithineDecarboxylase
                | K::ArginineDihydrolase
                | K::NitrateReduction
                | K::H2sProduction
                | K::EsculinHydrolysis => 2,
                _ => 1,
            },
            Self::Biochemical => match key {
                K::NaclTolerance | K::TemperatureRange | K::PhRange => 0,
                K::Glucose
                | K::Lactose
                | K::Sucrose
                | K::Mannitol
                | K::Sorbitol
                | K::Xylose
                | K::Arabinose
                | K::Trehalose
                | K::Inositol
                | K::Maltose
                | K::Raffinose
                | K::Fructose => 1,
                _ => 3,
            },
        }
    }
}

impl FromStr for WeightPreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "uniform" | "equal" => Ok(Self::Uniform),
            "biochemical" => Ok(Self::Biochemical),
            other => Err(ValidationError::UnknownPreset {
                name: other.to_string(),
            }),
        }
    }
}

/// An ordered, validated AttributeKey → Weight table.
///
/// Iteration order is the declared order; the scorer walks keys in exactly
/// this order, so comparison trails are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WeightProfile {
    entries: Vec<(AttributeKey, Weight)>,
}

impl WeightProfile {
    /// Construct a validated weight table.
    ///
    /// # Errors
    /// - `EmptyWeightTable` if `entries` is empty.
    /// - `DuplicateWeight` if a key appears twice.
    /// - `WeightOutOfRange` if a weight exceeds [`MAX_WEIGHT`].
    pub fn new(entries: Vec<(AttributeKey, Weight)>) -> Result<Self, ValidationError> {
        if entries.is_empty() {
            return Err(ValidationError::EmptyWeightTable);
        }
        let mut seen = Vec::with_capacity(entries.len());
        for &(key, weight) in &entries {
            if weight > MAX_WEIGHT {
                return Err(ValidationError::WeightOutOfRange {
                    key: key.to_string(),
                    weight,
                    max: MAX_WEIGHT,
                });
            }
            if seen.contains(&key) {
                return Err(ValidationError::DuplicateWeight {
                    key: key.to_string(),
                });
            }
            seen.push(key);
        }
        Ok(Self { entries })
    }

    /// Returns a copy with one key's weight replaced (or appended).
    ///
    /// # Errors
    /// Returns `WeightOutOfRange` if `weight` exceeds [`MAX_WEIGHT`].
    pub fn with_weight(&self, key: AttributeKey, weight: Weight) -> Result<Self, ValidationError> {
        if weight > MAX_WEIGHT {
            return Err(ValidationError::WeightOutOfRange {
                key: key.to_string(),
                weight,
                max: MAX_WEIGHT,
            });
        }
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = weight,
            None => entries.push((key, weight)),
        }
        Ok(Self { entries })
    }

    /// Weight of a key, if present.
    #[must_use]
    pub fn get(&self, key: AttributeKey) -> Option<Weight> {
        self.entries.iter().find(|(k, _)| *k == key).map(|&(_, w)| w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, Weight)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights; equals the scorer's `max_possible`.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|&(_, w)| u32::from(w)).sum()
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        WeightPreset::Standard.profile()
    }
}

impl From<WeightPreset> for WeightProfile {
    fn from(preset: WeightPreset) -> Self {
        preset.profile()
    }
}

impl<'de> Deserialize<'de> for WeightProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<(AttributeKey, Weight)>::deserialize(deserializer)?;
        WeightProfile::new(raw).map_err(serde::de::Error::custom)
    }
}
