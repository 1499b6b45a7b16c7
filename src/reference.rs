//! Static local reference table.
//!
//! Reference rows use the same column vocabulary as sample sheets, so the
//! builtin table and user-supplied tables go through one loader.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alias::column_alias;
use crate::attribute::TraitKind;
use crate::normalize::normalize;
use crate::profile::{CanonicalProfile, ProfileOrigin, TraitValue};
use crate::range::parse_range_str;

const NAME_COLUMNS: &[&str] = &["Nama_Bakteri", "Name", "Species"];
const DESCRIPTION_COLUMNS: &[&str] = &["Deskripsi", "Description"];
const HABITAT_COLUMNS: &[&str] = &["Habitat"];
const PATHOGENICITY_COLUMNS: &[&str] = &["Patogenisitas", "Pathogenicity"];
const SOURCE_COLUMNS: &[&str] = &["Sumber", "Source"];

type Row = &'static [(&'static str, &'static str)];

static BUILTIN_ROWS: &[Row] = &[
    &[
        ("Nama_Bakteri", "Escherichia coli"),
        ("Gram", "-"), ("Katalase", "+"), ("Oksidase", "-"), ("Glukosa", "+"), ("Laktosa", "+"),
        ("H2S", "-"), ("MR", "+"), ("VP", "-"), ("Citrate", "-"), ("Urease", "-"), ("Indol", "+"),
        ("Motilitas", "+"), ("Dnase", "-"), ("Esculin", "-"), ("Nitrate", "+"),
        ("Deskripsi", "Gram-negative rod, facultative anaerobe"),
        ("Habitat", "Human and animal gut, environment"),
        ("Patogenisitas", "Some strains pathogenic (EPEC, ETEC, EHEC)"),
    ],
    &[
        ("Nama_Bakteri", "Staphylococcus aureus"),
        ("Gram", "+"), ("Katalase", "+"), ("Oksidase", "-"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "-"), ("MR", "+"), ("VP", "+"), ("Citrate", "+"), ("Urease", "+"), ("Indol", "-"),
        ("Motilitas", "-"), ("Dnase", "+"), ("Esculin", "-"), ("Nitrate", "+"),
        ("Deskripsi", "Gram-positive cocci in clusters"),
        ("Habitat", "Human skin, nose and throat"),
        ("Patogenisitas", "Opportunistic pathogen; skin infections, pneumonia"),
    ],
    &[
        ("Nama_Bakteri", "Pseudomonas aeruginosa"),
        ("Gram", "-"), ("Katalase", "+"), ("Oksidase", "+"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "-"), ("MR", "-"), ("VP", "-"), ("Citrate", "+"), ("Urease", "-"), ("Indol", "-"),
        ("Motilitas", "+"), ("Dnase", "+"), ("Esculin", "-"), ("Nitrate", "+"),
        ("Deskripsi", "Gram-negative obligate aerobe producing blue-green pigment"),
        ("Habitat", "Soil, water, hospital environments"),
        ("Patogenisitas", "Nosocomial pathogen in immunocompromised patients"),
    ],
    &[
        ("Nama_Bakteri", "Salmonella spp."),
        ("Gram", "-"), ("Katalase", "+"), ("Oksidase", "-"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "+"), ("MR", "+"), ("VP", "-"), ("Citrate", "+"), ("Urease", "-"), ("Indol", "-"),
        ("Motilitas", "+"), ("Dnase", "-"), ("Esculin", "-"), ("Nitrate", "+"),
        ("Deskripsi", "Gram-negative facultative anaerobe, non-lactose fermenter"),
        ("Habitat", "Human and animal gut, contaminated food"),
        ("Patogenisitas", "Gastroenteritis, typhoid fever"),
    ],
    &[
        ("Nama_Bakteri", "Bacillus subtilis"),
        ("Gram", "+"), ("Katalase", "+"), ("Oksidase", "+"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "-"), ("MR", "-"), ("VP", "+"), ("Citrate", "+"), ("Urease", "-"), ("Indol", "-"),
        ("Motilitas", "+"), ("Dnase", "-"), ("Esculin", "+"), ("Nitrate", "+"),
        ("Deskripsi", "Gram-positive spore-forming rod"),
        ("Habitat", "Soil, water, decaying organic matter"),
        ("Patogenisitas", "Generally non-pathogenic; used as a probiotic"),
    ],
    &[
        ("Nama_Bakteri", "Streptococcus pyogenes"),
        ("Gram", "+"), ("Katalase", "-"), ("Oksidase", "-"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "-"), ("MR", "+"), ("VP", "-"), ("Citrate", "-"), ("Urease", "-"), ("Indol", "-"),
        ("Motilitas", "-"), ("Dnase", "-"), ("Esculin", "-"), ("Nitrate", "-"),
        ("Deskripsi", "Gram-positive cocci in chains"),
        ("Habitat", "Human throat and skin"),
        ("Patogenisitas", "Pharyngitis, impetigo, necrotizing fasciitis"),
    ],
    &[
        ("Nama_Bakteri", "Enterococcus faecalis"),
        ("Gram", "+"), ("Katalase", "-"), ("Oksidase", "-"), ("Glukosa", "+"), ("Laktosa", "-"),
        ("H2S", "-"), ("MR", "+"), ("VP", "+"), ("Citrate", "-"), ("Urease", "-"), ("Indol", "-"),
        ("Motilitas", "-"), ("Dnase", "-"), ("Esculin", "+"), ("Nitrate", "-"),
        ("Deskripsi", "Gram-positive cocci in pairs or chains"),
        ("Habitat", "Human and animal gut"),
        ("Patogenisitas", "Opportunistic pathogen; urinary tract infections, endocarditis"),
    ],
];

/// One reference species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub profile: CanonicalProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habitat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathogenicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A table of reference species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

fn is_column(header: &str, names: &[&str]) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(header))
}

impl ReferenceTable {
    /// The seven builtin reference species.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::from_rows(BUILTIN_ROWS.iter().map(|row| row.iter().copied()));
        for entry in &mut table.entries {
            entry.source = Some("local database".to_string());
        }
        table
    }

    /// Builds a table from tabular rows of `(column header, cell)` pairs.
    ///
    /// Attribute columns go through column-alias normalization; cells are
    /// normalized once, here. Rows without a species name are skipped.
    pub fn from_rows<R, I, K, V>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            match entry_from_row(row) {
                Some(entry) => entries.push(entry),
                None => warn!(row = index, "skipping reference row without a species name"),
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by species name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        self.entries
            .iter()
            .find(|e| e.profile.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Candidate set for ranking, keyed by species name.
    #[must_use]
    pub fn candidates(&self) -> Vec<(String, CanonicalProfile)> {
        self.entries
            .iter()
            .map(|e| (e.profile.name.clone(), e.profile.clone()))
            .collect()
    }
}

fn entry_from_row<I, K, V>(row: I) -> Option<ReferenceEntry>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut name = None;
    let mut profile = CanonicalProfile::new(String::new(), ProfileOrigin::Reference);
    let mut habitat = None;
    let mut pathogenicity = None;
    let mut source = None;

    for (header, cell) in row {
        let header = header.as_ref().trim();
        let cell = cell.as_ref().trim();
        if cell.is_empty() {
            continue;
        }
        let text = Some(cell.to_string());
        if is_column(header, NAME_COLUMNS) {
            name = text;
        } else if is_column(header, DESCRIPTION_COLUMNS) {
            profile.description = text;
        } else if is_column(header, HABITAT_COLUMNS) {
            habitat = text;
        } else if is_column(header, PATHOGENICITY_COLUMNS) {
            pathogenicity = text;
        } else if is_column(header, SOURCE_COLUMNS) {
            source = text;
        } else if let Some(key) = column_alias(header) {
            let value = match key.kind() {
                TraitKind::Categorical => TraitValue::Categorical(normalize(Some(cell))),
                TraitKind::Range => TraitValue::Range(parse_range_str(cell)),
            };
            profile.values.insert(key, value);
        }
    }

    profile.name = name?;
    Some(ReferenceEntry {
        profile,
        habitat,
        pathogenicity,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKey;
    use crate::normalize::Reading;
    use crate::range::Interval;

    #[test]
    fn test_builtin_species() {
        let table = ReferenceTable::builtin();
        assert_eq!(table.len(), 7);

        let ecoli = table.get("escherichia coli").unwrap();
        assert_eq!(ecoli.profile.origin, ProfileOrigin::Reference);
        assert_eq!(
            ecoli.profile.value(AttributeKey::Indole),
            TraitValue::Categorical(Reading::Positive)
        );
        assert_eq!(
            ecoli.profile.value(AttributeKey::Oxidase),
            TraitValue::Categorical(Reading::Negative)
        );
        assert!(ecoli.habitat.is_some());
        assert_eq!(ecoli.source.as_deref(), Some("local database"));
        // Sugars beyond glucose/lactose are not recorded.
        assert!(ecoli.profile.value(AttributeKey::Xylose).is_missing());
    }

    #[test]
    fn test_builtin_key_coverage() {
        for entry in ReferenceTable::builtin().entries() {
            assert_eq!(entry.profile.known_count(), 15, "{}", entry.profile.name);
        }
    }

    #[test]
    fn test_from_rows_with_ranges_and_nameless_rows() {
        let rows = vec![
            vec![("Name", "Vibrio cholerae"), ("Oxidase", "+"), ("Temperature_range", "18-37"), ("Deskripsi", "comma-shaped rod")],
            vec![("Oxidase", "-")],
        ];
        let table = ReferenceTable::from_rows(rows);
        assert_eq!(table.len(), 1);
        let vibrio = &table.entries()[0];
        assert_eq!(vibrio.profile.description.as_deref(), Some("comma-shaped rod"));
        assert_eq!(
            vibrio.profile.value(AttributeKey::TemperatureRange),
            TraitValue::Range(Interval::new(18.0, 37.0))
        );
        assert_eq!(table.candidates()[0].0, "Vibrio cholerae");
    }
}
