//! Domain inference rules.
//!
//! Some traits are rarely stated directly but follow from other data in the
//! record. A rule runs before generic path lookup for its key; a rule that
//! returns `None` hands over to the path table.

use crate::attribute::AttributeKey;
use crate::extract::path::{parse_path, resolve, resolve_first, Path};
use crate::normalize::{normalize_raw, Reading};
use crate::profile::TraitValue;
use crate::range::{parse_range_str, Interval};
use crate::value::RawValue;

const CULTURE: &str = "Culture and growth conditions";
const PHYS: &str = "Physiology and metabolism";

const GRAM_POSITIVE_PHYLA: &[&str] = &[
    "bacillota",
    "firmicutes",
    "actinomycetota",
    "actinobacteria",
    "deinococcota",
];

const GRAM_NEGATIVE_PHYLA: &[&str] = &[
    "pseudomonadota",
    "proteobacteria",
    "bacteroidota",
    "bacteroidetes",
    "campylobacterota",
    "fusobacteriota",
    "spirochaetota",
    "chlamydiota",
    "verrucomicrobiota",
    "acidobacteriota",
];

const PHYLUM_PATHS: &[&[&str]] = &[
    &["Name and taxonomic classification", "phylum"],
    &["Name and taxonomic classification", "LPSN", "phylum"],
    &["general", "taxonomy", "phylum"],
    &["taxonomy", "phylum"],
];

/// Fields that carry the growth outcome of one observation.
const GROWTH_FIELDS: &[&str] = &["growth", "ability"];

/// Runs the inference rule for `key`, if it has one.
///
/// `explicit` are the key's table paths; rules that only apply when no
/// explicit value exists consult them.
pub(crate) fn infer(key: AttributeKey, root: &RawValue, explicit: &[Path]) -> Option<TraitValue> {
    match key {
        AttributeKey::GramStain => gram_from_phylum(root, explicit),
        AttributeKey::TemperatureRange => {
            growth_hull(root, &[&[CULTURE, "culture temp"]], "temperature", false)
        }
        AttributeKey::PhRange => growth_hull(root, &[&[CULTURE, "culture pH"]], "pH", false),
        AttributeKey::NaclTolerance => growth_hull(
            root,
            &[&[PHYS, "halophily"], &[CULTURE, "halophily"]],
            "concentration",
            true,
        ),
        _ => None,
    }
}

fn gram_from_phylum(root: &RawValue, explicit: &[Path]) -> Option<TraitValue> {
    if resolve_first(root, explicit).is_some() {
        return None;
    }
    let phylum = PHYLUM_PATHS
        .iter()
        .find_map(|p| resolve(root, &parse_path(p)))
        .and_then(RawValue::scalar_text)?;
    let phylum = phylum.trim().to_lowercase();

    let reading = if GRAM_POSITIVE_PHYLA.contains(&phylum.as_str()) {
        Reading::Positive
    } else if GRAM_NEGATIVE_PHYLA.contains(&phylum.as_str()) {
        Reading::Negative
    } else {
        return None;
    };
    Some(TraitValue::Categorical(reading))
}

/// Hull of the `field` intervals of every observation that supports growth.
///
/// With `salt_only`, observations naming a salt other than NaCl, or giving
/// a concentration with a unit other than percent, are skipped.
fn growth_hull(
    root: &RawValue,
    list_paths: &[&[&str]],
    field: &str,
    salt_only: bool,
) -> Option<TraitValue> {
    let observations = list_paths
        .iter()
        .find_map(|p| resolve(root, &parse_path(p)))?;
    let records: &[RawValue] = match observations {
        RawValue::Seq(items) => items,
        single @ RawValue::Map(_) => std::slice::from_ref(single),
        _ => return None,
    };

    let hull = records
        .iter()
        .filter(|record| supports_growth(record))
        .filter(|record| !salt_only || is_nacl_percent(record, field))
        .filter_map(|record| record.get(field).and_then(observation_interval))
        .reduce(|acc, iv| acc.hull(&iv))?;
    Some(TraitValue::Range(Some(hull)))
}

fn supports_growth(record: &RawValue) -> bool {
    GROWTH_FIELDS
        .iter()
        .find_map(|f| record.get(f))
        .is_some_and(|v| normalize_raw(v) == Reading::Positive)
}

fn is_nacl_percent(record: &RawValue, field: &str) -> bool {
    let salt_ok = record
        .get("salt")
        .and_then(RawValue::as_str)
        .map_or(true, |s| s.trim().eq_ignore_ascii_case("NaCl"));
    let unit_ok = record
        .get(field)
        .and_then(RawValue::as_str)
        .map_or(true, |s| !s.chars().any(char::is_alphabetic));
    salt_ok && unit_ok
}

fn observation_interval(raw: &RawValue) -> Option<Interval> {
    match raw {
        RawValue::String(s) => parse_range_str(s),
        other => other.as_f64().and_then(Interval::point),
    }
}
