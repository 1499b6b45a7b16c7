//! BacDive API response shapes.
//!
//! The taxon search returns pages of strain IDs (`{"count", "next",
//! "results": [..]}`); the retrieve endpoint returns profiles either as an
//! ID-keyed mapping, wrapped in `"results"`, or as a list of records.

use crate::cache::ProfileSet;
use crate::extract::accession_label;
use crate::value::RawValue;

/// One page of a taxon search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    pub ids: Vec<String>,
    /// URL of the next page, if any.
    pub next: Option<String>,
}

/// Parses a taxon search page. Unrecognised shapes yield an empty page.
#[must_use]
pub fn parse_search_page(page: &RawValue) -> SearchPage {
    let results = page.get("results").unwrap_or(page);
    let ids = results
        .as_seq()
        .unwrap_or_default()
        .iter()
        .filter_map(strain_id)
        .collect();
    let next = page
        .get("next")
        .and_then(RawValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    SearchPage { ids, next }
}

fn strain_id(item: &RawValue) -> Option<String> {
    match item {
        RawValue::Int(n) => Some(n.to_string()),
        RawValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        RawValue::Map(_) => ["id", "BacDive-ID", "bacdive_id"]
            .iter()
            .find_map(|k| item.get(k))
            .and_then(strain_id),
        _ => None,
    }
}

/// Extracts the ID → profile mapping from a retrieve response.
#[must_use]
pub fn profiles_from_response(response: &RawValue) -> ProfileSet {
    let body = match response.get("results") {
        Some(results) if results.is_map() || results.is_seq() => results,
        _ => response,
    };
    match body {
        RawValue::Map(map) => map
            .iter()
            .filter(|(_, v)| v.is_map())
            .map(|(id, v)| (id.to_string(), v.clone()))
            .collect(),
        RawValue::Seq(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_map())
            .map(|(i, v)| {
                let id = accession_label(v)
                    .and_then(|label| label.strip_prefix("BacDive ").map(str::to_string))
                    .unwrap_or_else(|| i.to_string());
                (id, v.clone())
            })
            .collect(),
        _ => ProfileSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_page() {
        let page: RawValue = json!({
            "count": 3,
            "next": "https://api.bacdive.dsmz.de/taxon/Bacillus?page=2",
            "previous": null,
            "results": [1, "2", {"id": 3}, null]
        })
        .into();
        let parsed = parse_search_page(&page);
        assert_eq!(parsed.ids, vec!["1", "2", "3"]);
        assert_eq!(
            parsed.next.as_deref(),
            Some("https://api.bacdive.dsmz.de/taxon/Bacillus?page=2")
        );
    }

    #[test]
    fn test_parse_last_page() {
        let page: RawValue = json!({"count": 1, "next": null, "results": [42]}).into();
        let parsed = parse_search_page(&page);
        assert_eq!(parsed.ids, vec!["42"]);
        assert!(parsed.next.is_none());
        assert_eq!(parse_search_page(&RawValue::from("oops")), SearchPage::default());
    }

    #[test]
    fn test_profiles_from_wrapped_mapping() {
        let response: RawValue = json!({
            "count": 2,
            "results": {
                "159652": {"General": {"BacDive-ID": 159_652}},
                "17": {"General": {"BacDive-ID": 17}}
            }
        })
        .into();
        let set = profiles_from_response(&response);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first().map(|(id, _)| id), Some("159652"));
    }

    #[test]
    fn test_profiles_from_bare_mapping_and_list() {
        let bare: RawValue = json!({"5": {"General": {}}, "note": "skip me"}).into();
        assert_eq!(profiles_from_response(&bare).len(), 1);

        let list: RawValue = json!([{"General": {"BacDive-ID": 8}}, {"General": {}}]).into();
        let set = profiles_from_response(&list);
        assert!(set.get("8").is_some());
        assert!(set.get("1").is_some());
    }
}
