//! Raw profile trees.
//!
//! External trait records arrive as arbitrarily nested documents whose shape
//! differs from record to record. `RawValue` is a minimal tagged tree
//! (mapping / sequence / scalar) that the extractor walks without caring
//! about the concrete record layout. Mappings preserve document order, which
//! matters for "first non-metadata sub-field" fallbacks.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One node of a raw external record.
///
/// # Examples
///
/// ```
/// use bactident::RawValue;
///
/// let raw: RawValue = serde_json::json!({"gram stain": "negative"}).into();
/// assert!(raw.is_map());
/// assert_eq!(raw.get("Gram stain").and_then(RawValue::as_str), Some("negative"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Seq(Vec<RawValue>),
    Map(RawMap),
}

impl RawValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub const fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_map(&self) -> Option<&RawMap> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[RawValue]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view of a scalar. Strings are not coerced here.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Looks up a key if this node is a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Returns true for values that carry no information: null, blank
    /// strings, and empty sequences or mappings.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Seq(v) => v.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => false,
        }
    }

    /// Renders a scalar as text. Containers and null yield `None`.
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::String(v) => Some(v.clone()),
            Self::Null | Self::Seq(_) | Self::Map(_) => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Seq(v) => write!(f, "sequence[{}]", v.len()),
            Self::Map(m) => write!(f, "mapping[{}]", m.len()),
        }
    }
}

/// An insertion-ordered string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMap(Vec<(String, RawValue)>);

impl RawMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts or replaces a key, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    /// Key lookup: exact match first, then ASCII case-insensitive.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .or_else(|| self.0.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawMap {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        Self::Seq(v)
    }
}

impl From<RawMap> for RawValue {
    fn from(v: RawMap) -> Self {
        Self::Map(v)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            Value::Object(obj) => Self::Map(obj.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for RawMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON-like value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        RawValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Int(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(i64::try_from(v).map_or(RawValue::Float(v as f64), RawValue::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<RawValue>()? {
            items.push(item);
        }
        Ok(RawValue::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawValue, A::Error> {
        let mut map = RawMap::new();
        while let Some((k, v)) = access.next_entry::<String, RawValue>()? {
            map.insert(k, v);
        }
        Ok(RawValue::Map(map))
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_value_from_json() {
        let raw: RawValue = json!({"a": [1, 2.5, "x", null, true]}).into();
        let seq = raw.get("a").and_then(RawValue::as_seq).unwrap();
        assert_eq!(seq[0], RawValue::Int(1));
        assert_eq!(seq[1], RawValue::Float(2.5));
        assert_eq!(seq[2], RawValue::String("x".into()));
        assert!(seq[3].is_null());
        assert_eq!(seq[4], RawValue::Bool(true));
    }

    #[test]
    fn test_raw_map_preserves_order() {
        let raw: RawValue = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = raw.as_map().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_raw_map_case_insensitive_fallback() {
        let raw: RawValue = json!({"Gram stain": "positive", "gram stain": "negative"}).into();
        // Exact match wins over the case-insensitive fallback.
        assert_eq!(raw.get("gram stain").and_then(RawValue::as_str), Some("negative"));
        assert_eq!(raw.get("GRAM STAIN").and_then(RawValue::as_str), Some("positive"));
    }

    #[test]
    fn test_raw_map_insert_replaces_in_place() {
        let mut map = RawMap::new();
        map.insert("a", RawValue::Int(1));
        map.insert("b", RawValue::Int(2));
        map.insert("a", RawValue::Int(3));
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next(), Some(("a", &RawValue::Int(3))));
    }

    #[test]
    fn test_is_blank() {
        assert!(RawValue::Null.is_blank());
        assert!(RawValue::String("   ".into()).is_blank());
        assert!(RawValue::Seq(vec![]).is_blank());
        assert!(RawValue::Map(RawMap::new()).is_blank());
        assert!(!RawValue::Bool(false).is_blank());
        assert!(!RawValue::Int(0).is_blank());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(RawValue::Bool(true).scalar_text().as_deref(), Some("true"));
        assert_eq!(RawValue::Int(37).scalar_text().as_deref(), Some("37"));
        assert!(RawValue::Seq(vec![]).scalar_text().is_none());
    }

    #[test]
    fn test_serde_roundtrip_keeps_shape() {
        let text = r#"{"b":{"result":"+","method":"API"},"a":[1,"two"]}"#;
        let raw: RawValue = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&raw).unwrap(), text);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(RawValue::Null.type_name(), "null");
        assert_eq!(RawValue::Seq(vec![]).type_name(), "sequence");
        assert_eq!(RawValue::Map(RawMap::new()).type_name(), "mapping");
    }
}
