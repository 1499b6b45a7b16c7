//! Display-name resolution for raw profiles.

use std::sync::OnceLock;

use regex::Regex;

use crate::extract::path::{parse_path, resolve};
use crate::profile::UNKNOWN_SPECIES;
use crate::value::RawValue;

const TAXONOMY_PATHS: &[&[&str]] = &[
    &["Name and taxonomic classification"],
    &["general", "taxonomy"],
    &["General", "taxonomy"],
    &["taxonomy"],
];

const ACCESSION_PATHS: &[&[&str]] = &[
    &["General", "BacDive-ID"],
    &["general", "BacDive-ID"],
    &["BacDive-ID"],
    &["bacdive_id"],
    &["id"],
];

fn markup_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

fn parenthetical_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)").ok()).as_ref()
}

/// Strips inline markup and parenthetical annotations, collapsing whitespace.
pub(crate) fn clean_taxon_text(raw: &str) -> String {
    let mut text = raw.to_string();
    if let Some(re) = markup_re() {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = parenthetical_re() {
        text = re.replace_all(&text, " ").into_owned();
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_field(record: &RawValue, field: &str) -> Option<String> {
    let cleaned = clean_taxon_text(&record.get(field)?.scalar_text()?);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

/// Accession-derived label (`BacDive 1234`), if the record carries an ID.
#[must_use]
pub fn accession_label(root: &RawValue) -> Option<String> {
    let id = ACCESSION_PATHS
        .iter()
        .find_map(|p| resolve(root, &parse_path(p)))?;
    match id {
        RawValue::Int(n) => Some(format!("BacDive {n}")),
        RawValue::String(s) if !s.trim().is_empty() && s.trim().chars().all(|c| c.is_ascii_digit()) => {
            Some(format!("BacDive {}", s.trim()))
        }
        _ => None,
    }
}

/// Resolves the display name of a raw profile.
///
/// Falls back to the accession label when no taxonomy record exists, and to
/// [`UNKNOWN_SPECIES`] when that is absent too.
#[must_use]
pub fn resolve_name(root: &RawValue, include_strain: bool) -> String {
    let taxonomy = TAXONOMY_PATHS
        .iter()
        .filter_map(|p| resolve(root, &parse_path(p)))
        .find(|node| node.is_map());

    let binomial = taxonomy.and_then(binomial);
    let Some((genus, epithet)) = binomial else {
        return accession_label(root).unwrap_or_else(|| UNKNOWN_SPECIES.to_string());
    };

    let mut name = match epithet {
        Some(epithet) => format!("{genus} {epithet}"),
        None => format!("{genus} sp."),
    };
    if let Some(subspecies) = taxonomy.and_then(subspecies) {
        name.push_str(" subsp. ");
        name.push_str(&subspecies);
    }
    if include_strain {
        if let Some(strain) = taxonomy.and_then(|t| strain(t, root)) {
            name.push(' ');
            name.push_str(&strain);
        }
    }
    name
}

/// Genus and species epithet from a taxonomy record.
fn binomial(taxonomy: &RawValue) -> Option<(String, Option<String>)> {
    let mut genus = text_field(taxonomy, "genus");
    let species = text_field(taxonomy, "species").unwrap_or_default();
    let tokens: Vec<&str> = species.split_whitespace().collect();

    let epithet = match tokens.as_slice() {
        [] => None,
        [first, second, ..] if starts_uppercase(first) => {
            if genus.is_none() {
                genus = Some((*first).to_string());
            }
            Some((*second).to_string())
        }
        [only] if genus.as_deref().is_some_and(|g| g.eq_ignore_ascii_case(only)) => None,
        [first, ..] => Some((*first).to_string()),
    };

    let genus = genus.and_then(|g| g.split_whitespace().next().map(str::to_string))?;
    Some((genus, epithet))
}

fn subspecies(taxonomy: &RawValue) -> Option<String> {
    let raw = text_field(taxonomy, "subspecies")?;
    let tail = raw
        .rsplit_once("subsp.")
        .map_or(raw.as_str(), |(_, after)| after);
    tail.split_whitespace().last().map(str::to_string)
}

/// Strain designation, in priority order: dedicated field, the full
/// scientific name beyond the binomial, the accession label.
fn strain(taxonomy: &RawValue, root: &RawValue) -> Option<String> {
    if let Some(designation) = text_field(taxonomy, "strain designation") {
        let first = designation.split(',').next().unwrap_or_default().trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    let full_name = text_field(taxonomy, "full scientific name").or_else(|| {
        taxonomy
            .get("LPSN")
            .and_then(|lpsn| text_field(lpsn, "full scientific name"))
    });
    if let Some(full_name) = full_name {
        let rest: Vec<&str> = full_name.split_whitespace().skip(2).collect();
        if !rest.is_empty() {
            return Some(rest.join(" "));
        }
    }

    accession_label(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_taxon_text() {
        assert_eq!(clean_taxon_text("<I>Bacillus</I>  <I>subtilis</I>"), "Bacillus subtilis");
        assert_eq!(
            clean_taxon_text("Bacillus subtilis (Ehrenberg 1835) Cohn 1872"),
            "Bacillus subtilis Cohn 1872"
        );
    }

    #[test]
    fn test_bacdive_taxonomy_record() {
        let root: RawValue = json!({
            "General": {"BacDive-ID": 1234},
            "Name and taxonomic classification": {
                "genus": "Bacillus",
                "species": "<I>Bacillus subtilis</I>",
                "strain designation": "168, Marburg"
            }
        })
        .into();
        assert_eq!(resolve_name(&root, false), "Bacillus subtilis");
        assert_eq!(resolve_name(&root, true), "Bacillus subtilis 168");
    }

    #[test]
    fn test_legacy_taxonomy_with_subspecies() {
        let root: RawValue = json!({
            "general": {"taxonomy": {
                "genus": "Salmonella",
                "species": "enterica",
                "subspecies": "Salmonella enterica subsp. arizonae"
            }}
        })
        .into();
        assert_eq!(resolve_name(&root, false), "Salmonella enterica subsp. arizonae");
    }

    #[test]
    fn test_strain_from_full_scientific_name() {
        let root: RawValue = json!({
            "Name and taxonomic classification": {
                "species": "Escherichia coli",
                "LPSN": {"full scientific name": "Escherichia coli (Migula 1895) Castellani and Chalmers 1919"}
            }
        })
        .into();
        assert_eq!(
            resolve_name(&root, true),
            "Escherichia coli Castellani and Chalmers 1919"
        );
    }

    #[test]
    fn test_strain_falls_back_to_accession() {
        let root: RawValue = json!({
            "General": {"BacDive-ID": "77"},
            "Name and taxonomic classification": {"genus": "Vibrio", "species": "cholerae"}
        })
        .into();
        assert_eq!(resolve_name(&root, true), "Vibrio cholerae BacDive 77");
    }

    #[test]
    fn test_genus_only() {
        let root: RawValue = json!({"taxonomy": {"genus": "Bacillus", "species": "Bacillus"}}).into();
        assert_eq!(resolve_name(&root, false), "Bacillus sp.");
    }

    #[test]
    fn test_fallbacks_without_taxonomy() {
        let with_id: RawValue = json!({"bacdive_id": 5150, "morphology": {}}).into();
        assert_eq!(resolve_name(&with_id, true), "BacDive 5150");

        let bare: RawValue = json!({"morphology": {"motility": "yes"}}).into();
        assert_eq!(resolve_name(&bare, true), UNKNOWN_SPECIES);
    }
}
