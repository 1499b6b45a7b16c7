//! The AttributeKey → candidate-path table.
//!
//! This is a data asset: biological mapping corrections belong here (or in a
//! TOML override), never in scoring code. Paths are tried in order and the
//! first one that resolves wins. Current BacDive section names come first,
//! followed by the flattened legacy layout used by older cached records.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::attribute::AttributeKey;
use crate::error::ValidationError;
use crate::extract::path::{parse_path, Path};

/// Version of the builtin table. Bump on any mapping change.
pub const TABLE_VERSION: u32 = 3;

const PHYS: &str = "Physiology and metabolism";
const LEGACY_PHYS: &str = "physiology and metabolism";
const LEGACY_CULTURE: &str = "culture and growth conditions";

type RawPaths = &'static [&'static [&'static str]];

macro_rules! enzyme {
    ($name:literal, $legacy:literal) => {
        &[
            &[PHYS, "enzymes", concat!("[value=", $name, "]"), "activity"],
            &[LEGACY_PHYS, $legacy],
            &[LEGACY_PHYS, "enzymes", $legacy],
        ]
    };
}

macro_rules! sugar {
    ($metabolite:literal, $legacy:literal) => {
        &[
            &[PHYS, "metabolite utilization", concat!("[metabolite=", $metabolite, "]"), "utilization activity"],
            &[LEGACY_PHYS, concat!($legacy, " utilization")],
            &[LEGACY_PHYS, "metabolite utilization", $legacy],
        ]
    };
    ($metabolite:literal, $legacy:literal, $api:literal) => {
        &[
            &[PHYS, "metabolite utilization", concat!("[metabolite=", $metabolite, "]"), "utilization activity"],
            &[PHYS, "API 20E", $api],
            &[LEGACY_PHYS, concat!($legacy, " utilization")],
            &[LEGACY_PHYS, "metabolite utilization", $legacy],
        ]
    };
}

static BUILTIN: &[(AttributeKey, RawPaths)] = &[
    (
        AttributeKey::GramStain,
        &[
            &["Morphology", "cell morphology", "gram stain"],
            &["morphology", "gram stain"],
            &["morphology", "Gram reaction"],
        ],
    ),
    (
        AttributeKey::Motility,
        &[&["Morphology", "cell morphology", "motility"], &["morphology", "motility"]],
    ),
    (AttributeKey::Catalase, enzyme!("catalase", "catalase")),
    (
        AttributeKey::Oxidase,
        &[
            &[PHYS, "enzymes", "[value=cytochrome oxidase]", "activity"],
            &[PHYS, "enzymes", "[value=oxidase]", "activity"],
            &[PHYS, "API 20E", "OX"],
            &[LEGACY_PHYS, "oxidase"],
            &[LEGACY_PHYS, "enzymes", "oxidase"],
        ],
    ),
    (
        AttributeKey::Urease,
        &[
            &[PHYS, "enzymes", "[value=urease]", "activity"],
            &[PHYS, "API 20E", "URE"],
            &[LEGACY_PHYS, "urease"],
            &[LEGACY_PHYS, "enzymes", "urease"],
        ],
    ),
    (AttributeKey::DNase, enzyme!("DNase", "DNase")),
    (
        AttributeKey::Gelatinase,
        &[
            &[PHYS, "enzymes", "[value=gelatinase]", "activity"],
            &[PHYS, "metabolite utilization", "[metabolite=gelatin]", "utilization activity"],
            &[PHYS, "API 20E", "GEL"],
            &[LEGACY_PHYS, "gelatinase"],
            &[LEGACY_PHYS, "enzymes", "gelatinase"],
        ],
    ),
    (
        AttributeKey::Indole,
        &[
            &[PHYS, "metabolite tests", "indole test"],
            &[PHYS, "metabolite production", "[metabolite=indole]", "production"],
            &[PHYS, "API 20E", "IND"],
            &[LEGACY_PHYS, "indole test"],
        ],
    ),
    (
        AttributeKey::MethylRed,
        &[&[PHYS, "metabolite tests", "methylred-test"], &[LEGACY_PHYS, "methyl red test"]],
    ),
    (
        AttributeKey::VogesProskauer,
        &[
            &[PHYS, "metabolite tests", "voges-proskauer-test"],
            &[PHYS, "API 20E", "VP"],
            &[LEGACY_PHYS, "voges proskauer test"],
        ],
    ),
    (
        AttributeKey::Citrate,
        &[
            &[PHYS, "metabolite tests", "citrate test"],
            &[PHYS, "metabolite utilization", "[metabolite=citrate]", "utilization activity"],
            &[PHYS, "API 20E", "CIT"],
            &[LEGACY_PHYS, "citrate utilization"],
        ],
    ),
    (
        AttributeKey::LysineDecarboxylase,
        &[
            &[PHYS, "enzymes", "[value=lysine decarboxylase]", "activity"],
            &[PHYS, "API 20E", "LDC Lys"],
            &[LEGACY_PHYS, "lysine decarboxylase"],
        ],
    ),
    (
        AttributeKey::OrnithineDecarboxylase,
        &[
            &[PHYS, "enzymes", "[value=ornithine decarboxylase]", "activity"],
            &[PHYS, "API 20E", "ODC"],
            &[LEGACY_PHYS, "ornithine decarboxylase"],
        ],
    ),
    (
        AttributeKey::ArginineDihydrolase,
        &[
            &[PHYS, "enzymes", "[value=arginine dihydrolase]", "activity"],
            &[PHYS, "API 20E", "ADH Arg"],
            &[LEGACY_PHYS, "arginine dihydrolase"],
        ],
    ),
    (
        AttributeKey::NitrateReduction,
        &[
            &[PHYS, "metabolite utilization", "[metabolite=nitrate]", "utilization activity"],
            &[LEGACY_PHYS, "nitrate reduction"],
        ],
    ),
    (
        AttributeKey::H2sProduction,
        &[
            &[PHYS, "metabolite production", "[metabolite=hydrogen sulfide]", "production"],
            &[PHYS, "API 20E", "H2S"],
            &[LEGACY_PHYS, "H2S production"],
        ],
    ),
    (
        AttributeKey::EsculinHydrolysis,
        &[
            &[PHYS, "metabolite utilization", "[metabolite=esculin]", "utilization activity"],
            &[LEGACY_PHYS, "esculin hydrolysis"],
        ],
    ),
    (AttributeKey::Glucose, sugar!("D-glucose", "glucose", "GLU")),
    (AttributeKey::Lactose, sugar!("lactose", "lactose")),
    (AttributeKey::Sucrose, sugar!("sucrose", "sucrose", "SAC")),
    (AttributeKey::Mannitol, sugar!("D-mannitol", "mannitol", "MAN")),
    (AttributeKey::Sorbitol, sugar!("D-sorbitol", "sorbitol", "SOR")),
    (AttributeKey::Xylose, sugar!("D-xylose", "xylose")),
    (AttributeKey::Arabinose, sugar!("L-arabinose", "arabinose", "ARA")),
    (AttributeKey::Trehalose, sugar!("trehalose", "trehalose")),
    (AttributeKey::Inositol, sugar!("myo-inositol", "inositol", "INO")),
    (AttributeKey::Maltose, sugar!("maltose", "maltose")),
    (AttributeKey::Raffinose, sugar!("raffinose", "raffinose")),
    (AttributeKey::Fructose, sugar!("D-fructose", "fructose")),
    (
        AttributeKey::NaclTolerance,
        &[&[LEGACY_CULTURE, "sodium chloride (NaCl) growth tolerance"]],
    ),
    (
        AttributeKey::TemperatureRange,
        &[&[LEGACY_CULTURE, "temperature range"]],
    ),
    (AttributeKey::PhRange, &[&[LEGACY_CULTURE, "pH range"]]),
];

/// Candidate lookup paths for every attribute key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitTable {
    version: u32,
    paths: BTreeMap<AttributeKey, Vec<Path>>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    version: Option<u32>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<Vec<String>>>,
}

impl TraitTable {
    /// The builtin table.
    #[must_use]
    pub fn builtin() -> Self {
        let paths = BUILTIN
            .iter()
            .map(|(key, raw)| (*key, raw.iter().map(|p| parse_path(p)).collect()))
            .collect();
        Self {
            version: TABLE_VERSION,
            paths,
        }
    }

    /// The builtin table with per-key overrides from a TOML document:
    ///
    /// ```toml
    /// version = 4
    /// [paths]
    /// Catalase = [["Physiology and metabolism", "enzymes", "[value=catalase]", "activity"]]
    /// ```
    ///
    /// Listed keys have their paths replaced; unlisted keys keep the builtin ones.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for malformed TOML, `UnknownAttribute` for an
    /// unrecognised key, and `InvalidPath` for empty paths or steps.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        let file: TableFile = toml::from_str(text).map_err(|e| ValidationError::InvalidConfig {
            field: "trait_table".to_string(),
            reason: e.to_string(),
        })?;

        let mut table = Self::builtin();
        if let Some(version) = file.version {
            table.version = version;
        }
        for (name, raw_paths) in file.paths {
            let key: AttributeKey = name.parse()?;
            let mut parsed = Vec::with_capacity(raw_paths.len());
            for raw in raw_paths {
                if raw.is_empty() || raw.iter().any(|s| s.trim().is_empty()) {
                    return Err(ValidationError::InvalidPath {
                        key: key.to_string(),
                        reason: "paths and steps must be non-empty".to_string(),
                    });
                }
                parsed.push(parse_path(&raw));
            }
            table.paths.insert(key, parsed);
        }
        Ok(table)
    }

    /// Table version, recorded alongside extracted profiles.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Candidate paths for a key, in priority order.
    #[must_use]
    pub fn paths(&self, key: AttributeKey) -> &[Path] {
        self.paths.get(&key).map_or(&[], Vec::as_slice)
    }
}

impl Default for TraitTable {
    fn default() -> Self {
        Self::builtin()
    }
}
