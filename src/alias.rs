//! Column-alias normalization for tabular sample data.
//!
//! Lab sheets arrive with localized or free-text column headers
//! ("Katalase", "Pewarnaan Gram", ...). These map onto canonical
//! [`AttributeKey`]s once, before scoring.

use crate::attribute::AttributeKey;

/// Known header aliases. Canonical key names are accepted as well.
pub const COLUMN_ALIASES: &[(&str, AttributeKey)] = &[
    ("Motilitas", AttributeKey::Motility),
    ("Pewarnaan Gram", AttributeKey::GramStain),
    ("Gram", AttributeKey::GramStain),
    ("Gram stain", AttributeKey::GramStain),
    ("Katalase", AttributeKey::Catalase),
    ("Oksidase", AttributeKey::Oxidase),
    ("Indol", AttributeKey::Indole),
    ("Dnase", AttributeKey::DNase),
    ("Gelatin", AttributeKey::Gelatinase),
    ("Nitrate Reduction", AttributeKey::NitrateReduction),
    ("Nitrate", AttributeKey::NitrateReduction),
    ("Reduksi Nitrat", AttributeKey::NitrateReduction),
    ("H2S", AttributeKey::H2sProduction),
    ("Esculin", AttributeKey::EsculinHydrolysis),
    ("Methyl Red", AttributeKey::MethylRed),
    ("Voges-Proskauer", AttributeKey::VogesProskauer),
    ("Sitrat", AttributeKey::Citrate),
    ("Glukosa", AttributeKey::Glucose),
    ("Laktosa", AttributeKey::Lactose),
    ("Maltosa", AttributeKey::Maltose),
    ("Sukrosa", AttributeKey::Sucrose),
    ("Manitol", AttributeKey::Mannitol),
    ("Xilosa", AttributeKey::Xylose),
    ("Arabinosa", AttributeKey::Arabinose),
    ("Trehalosa", AttributeKey::Trehalose),
    ("Inositol", AttributeKey::Inositol),
    ("Rafinosa", AttributeKey::Raffinose),
    ("Fruktosa", AttributeKey::Fructose),
    ("Suhu", AttributeKey::TemperatureRange),
    ("Temperature", AttributeKey::TemperatureRange),
    ("pH", AttributeKey::PhRange),
    ("NaCl", AttributeKey::NaclTolerance),
];

/// Maps a column header to its attribute key, if it names one.
///
/// Headers are trimmed; aliases and canonical names match
/// case-insensitively.
#[must_use]
pub fn column_alias(header: &str) -> Option<AttributeKey> {
    let header = header.trim();
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(header))
        .map(|(_, key)| *key)
        .or_else(|| header.parse().ok())
}

/// Splits headers into recognised keys and the rest.
///
/// Returns `(header, key)` pairs for recognised columns and the trimmed
/// unrecognised headers, both in input order.
pub fn normalize_columns<'a, I>(headers: I) -> (Vec<(&'a str, AttributeKey)>, Vec<&'a str>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for header in headers {
        match column_alias(header) {
            Some(key) => known.push((header, key)),
            None => unknown.push(header.trim()),
        }
    }
    (known, unknown)
}
