//! Multi-step lookups over raw profile trees.
//!
//! A path is a list of steps. A key step indexes a mapping, or, when the
//! current node is a sequence, descends into the first mapping element that
//! carries the key. A filter step (`[field=value]`) selects the first record
//! of a sequence whose `field` equals `value`.

use std::fmt;

use crate::value::RawValue;

/// One lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Index a mapping by key.
    Key(String),
    /// Select the first record whose `field` equals `equals` (case-insensitive).
    Find { field: String, equals: String },
}

impl Step {
    /// Parses one step. `[field=value]` is a filter, anything else a key.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let filter = raw
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .and_then(|inner| inner.split_once('='));
        match filter {
            Some((field, equals)) if !field.trim().is_empty() => Self::Find {
                field: field.trim().to_string(),
                equals: equals.trim().to_string(),
            },
            _ => Self::Key(raw.to_string()),
        }
    }

    fn apply<'a>(&self, node: &'a RawValue) -> Option<&'a RawValue> {
        match self {
            Self::Key(key) => match node {
                RawValue::Map(map) => map.get(key),
                RawValue::Seq(items) => items.iter().find_map(|item| item.get(key)),
                _ => None,
            },
            Self::Find { field, equals } => match node {
                RawValue::Seq(items) => items.iter().find(|item| record_matches(item, field, equals)),
                RawValue::Map(_) if record_matches(node, field, equals) => Some(node),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Find { field, equals } => write!(f, "[{field}={equals}]"),
        }
    }
}

fn record_matches(record: &RawValue, field: &str, equals: &str) -> bool {
    record
        .get(field)
        .and_then(RawValue::scalar_text)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(equals))
}

/// An ordered list of steps.
pub type Path = Vec<Step>;

/// Parses a path from its textual steps.
#[must_use]
pub fn parse_path<S: AsRef<str>>(steps: &[S]) -> Path {
    steps.iter().map(|s| Step::parse(s.as_ref())).collect()
}

/// Walks `path` from `root`. Returns `None` on any missing key or type
/// mismatch, and when the final node is blank.
#[must_use]
pub fn resolve<'a>(root: &'a RawValue, path: &[Step]) -> Option<&'a RawValue> {
    let mut node = root;
    for step in path {
        node = step.apply(node)?;
    }
    (!node.is_blank()).then_some(node)
}

/// Tries each path in order; the first one that resolves wins.
#[must_use]
pub fn resolve_first<'a>(root: &'a RawValue, paths: &[Path]) -> Option<&'a RawValue> {
    paths.iter().find_map(|p| resolve(root, p))
}
