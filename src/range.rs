//! Numeric interval parsing and overlap.
//!
//! Growth temperature, pH and salinity tolerance show up as scalars, pairs,
//! `{min, max}` records or dashed strings. Every shape funnels into an
//! `Interval`; anything unparseable is simply "no range known".

use serde::{Deserialize, Serialize};

use crate::value::RawValue;

/// A closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Creates an interval, swapping bounds given in descending order.
    /// Returns `None` for non-finite bounds.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        Some(Self {
            min: a.min(b),
            max: a.max(b),
        })
    }

    #[must_use]
    pub fn point(x: f64) -> Option<Self> {
        Self::new(x, x)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Smallest interval covering both.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Intersection-over-union of two intervals, in `[0, 1]`.
    ///
    /// Returns 0 when the union has zero length, so two identical points do
    /// not count as overlap.
    #[must_use]
    pub fn overlap_ratio(&self, other: &Self) -> f64 {
        let intersection = (self.max.min(other.max) - self.min.max(other.min)).max(0.0);
        let union = self.max.max(other.max) - self.min.min(other.min);
        if union <= 0.0 {
            return 0.0;
        }
        (intersection / union).clamp(0.0, 1.0)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.max - self.min).abs() < f64::EPSILON {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Overlap ratio of two optional intervals; 0 if either is missing.
#[must_use]
pub fn overlap_ratio(a: Option<&Interval>, b: Option<&Interval>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => a.overlap_ratio(b),
        _ => 0.0,
    }
}

/// Parses any raw value shape into an interval.
///
/// # Examples
///
/// ```
/// use bactident::{parse_range, Interval, RawValue};
///
/// assert_eq!(parse_range(&RawValue::from("20-37")), Interval::new(20.0, 37.0));
/// assert_eq!(parse_range(&RawValue::Int(30)), Interval::point(30.0));
/// assert_eq!(parse_range(&RawValue::from("not a number")), None);
/// ```
#[must_use]
pub fn parse_range(raw: &RawValue) -> Option<Interval> {
    match raw {
        RawValue::Int(_) | RawValue::Float(_) => raw.as_f64().and_then(Interval::point),
        RawValue::String(s) => parse_range_str(s),
        RawValue::Map(map) => {
            let min = map.get("min").and_then(coerce_f64)?;
            let max = map.get("max").and_then(coerce_f64)?;
            Interval::new(min, max)
        }
        RawValue::Seq(items) if items.len() == 2 => {
            Interval::new(coerce_f64(&items[0])?, coerce_f64(&items[1])?)
        }
        _ => None,
    }
}

/// Parses `"20-37"`, `"20–37"` (en-dash), `"30"`, and the same with a
/// trailing unit such as `°C`, `%` or `pH`.
#[must_use]
pub fn parse_range_str(raw: &str) -> Option<Interval> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    // Skip the first character so a leading minus sign is not a separator.
    let mut chars = text.char_indices();
    chars.next();
    let split = chars.find(|&(_, c)| c == '-' || c == '\u{2013}');
    match split {
        Some((at, sep)) => {
            let (left, right) = (&text[..at], &text[at + sep.len_utf8()..]);
            Interval::new(parse_number(left)?, parse_number(right)?)
        }
        None => Interval::point(parse_number(text)?),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_alphabetic() || c == '%' || c == '°' || c.is_whitespace())
        .trim();
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn coerce_f64(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Int(_) | RawValue::Float(_) => raw.as_f64(),
        RawValue::String(s) => parse_number(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawValue {
        v.into()
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_range(&raw(json!(30))), Interval::point(30.0));
        assert_eq!(parse_range(&raw(json!(6.5))), Interval::point(6.5));
        assert_eq!(parse_range(&raw(json!("30"))), Interval::point(30.0));
    }

    #[test]
    fn test_parse_dashed_strings() {
        assert_eq!(parse_range(&raw(json!("20-37"))), Interval::new(20.0, 37.0));
        assert_eq!(parse_range(&raw(json!("20\u{2013}37"))), Interval::new(20.0, 37.0));
        assert_eq!(parse_range(&raw(json!(" 4 - 9 "))), Interval::new(4.0, 9.0));
        assert_eq!(parse_range(&raw(json!("10-45 °C"))), Interval::new(10.0, 45.0));
        assert_eq!(parse_range(&raw(json!("0-6.5 %"))), Interval::new(0.0, 6.5));
        assert_eq!(parse_range(&raw(json!("-2-10"))), Interval::new(-2.0, 10.0));
    }

    #[test]
    fn test_parse_alphabetic_unit_suffix() {
        assert_eq!(parse_range(&raw(json!("4.5 - 9.0 pH"))), Interval::new(4.5, 9.0));
        assert_eq!(parse_range(&raw(json!("20-37 °C"))), Interval::new(20.0, 37.0));
        assert_eq!(parse_range(&raw(json!("3 % NaCl"))), Interval::point(3.0));
        assert_eq!(parse_range(&raw(json!({"min": "4 pH", "max": "9 pH"}))), Interval::new(4.0, 9.0));
        assert_eq!(parse_range(&raw(json!("pH"))), None);
    }

    #[test]
    fn test_parse_record_and_pair() {
        assert_eq!(parse_range(&raw(json!({"min": 4, "max": 9}))), Interval::new(4.0, 9.0));
        assert_eq!(parse_range(&raw(json!({"min": "4", "max": "9"}))), Interval::new(4.0, 9.0));
        assert_eq!(parse_range(&raw(json!({"min": 4}))), None);
        assert_eq!(parse_range(&raw(json!({"min": 4, "max": "warm"}))), None);
        assert_eq!(parse_range(&raw(json!([15, 42]))), Interval::new(15.0, 42.0));
        assert_eq!(parse_range(&raw(json!([15, "x"]))), None);
        assert_eq!(parse_range(&raw(json!([1, 2, 3]))), None);
    }

    #[test]
    fn test_parse_failures_degrade_to_none() {
        assert_eq!(parse_range(&raw(json!("not a number"))), None);
        assert_eq!(parse_range(&raw(json!("20-warm"))), None);
        assert_eq!(parse_range(&raw(json!(""))), None);
        assert_eq!(parse_range(&RawValue::Null), None);
        assert_eq!(parse_range(&RawValue::Bool(true)), None);
    }

    #[test]
    fn test_descending_bounds_are_swapped() {
        assert_eq!(parse_range_str("37-20"), Interval::new(20.0, 37.0));
        let iv = Interval::new(37.0, 20.0).unwrap();
        assert!(iv.min <= iv.max);
    }

    #[test]
    fn test_overlap_ratio_partial() {
        let a = Interval::new(20.0, 37.0).unwrap();
        let b = Interval::new(25.0, 40.0).unwrap();
        let r = a.overlap_ratio(&b);
        assert!(r > 0.0 && r < 1.0);
        assert!((r - 12.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_ratio_identical_and_disjoint() {
        let a = Interval::new(20.0, 37.0).unwrap();
        assert!((a.overlap_ratio(&a) - 1.0).abs() < f64::EPSILON);
        let far = Interval::new(50.0, 60.0).unwrap();
        assert_eq!(a.overlap_ratio(&far), 0.0);
    }

    #[test]
    fn test_overlap_ratio_zero_union() {
        let p = Interval::point(30.0).unwrap();
        assert_eq!(p.overlap_ratio(&p), 0.0);
        assert_eq!(overlap_ratio(Some(&p), None), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::new(20.0, 37.0).unwrap().to_string(), "20-37");
        assert_eq!(Interval::point(30.0).unwrap().to_string(), "30");
    }
}
