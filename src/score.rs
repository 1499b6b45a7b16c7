//! Weighted similarity scoring.
//!
//! A sample is compared against one canonical profile, key by key, in the
//! weight table's declared order. Every weighted key contributes to the
//! denominator whether or not either side measured it: an unmeasured trait
//! is not evidence of similarity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeKey, TraitKind, Weight, WeightProfile};
use crate::normalize::{normalize, Reading};
use crate::profile::{CanonicalProfile, TraitValue};
use crate::range::{parse_range_str, Interval};
use crate::sample::SampleInput;

/// Overlap ratio at or above which a range comparison is a match.
pub const RANGE_MATCH_RATIO: f64 = 0.75;

/// Overlap ratio above which a range comparison earns partial credit.
pub const RANGE_PARTIAL_RATIO: f64 = 0.1;

/// Credit factor when either side of a categorical comparison is variable.
pub const VARIABLE_CREDIT: f64 = 0.5;

/// Outcome of comparing one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Match,
    Mismatch,
    /// Variable trait involved, or a partial range overlap.
    Partial,
    /// Insufficient data on either side.
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One row of the comparison trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDetail {
    pub key: AttributeKey,
    /// The sample's value exactly as entered.
    pub input: Option<String>,
    /// The reference profile's normalized value.
    pub reference: TraitValue,
    pub weight: Weight,
    pub verdict: Verdict,
    /// Score added by this key, in `[0, weight]`.
    pub contribution: f64,
}

/// Result of scoring one sample against one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    /// `score / max_possible * 100`, unrounded.
    pub percentage: f64,
    pub score: f64,
    pub max_possible: u32,
    pub details: Vec<ComparisonDetail>,
}

impl Similarity {
    /// Number of details with the given verdict.
    #[must_use]
    pub fn count(&self, verdict: Verdict) -> usize {
        self.details.iter().filter(|d| d.verdict == verdict).count()
    }
}

/// Qualitative reading of a similarity percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    NoMatch,
    Low,
    Medium,
    High,
    Perfect,
}

impl ConfidenceBand {
    /// Band for a percentage in `[0, 100]`.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 95.0 {
            Self::Perfect
        } else if percentage >= 80.0 {
            Self::High
        } else if percentage >= 60.0 {
            Self::Medium
        } else if percentage >= 40.0 {
            Self::Low
        } else {
            Self::NoMatch
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Perfect => "perfect",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::NoMatch => "no match",
        };
        f.write_str(s)
    }
}

/// Scores `sample` against `profile` under `weights`.
///
/// # Examples
///
/// ```
/// use bactident::{score, AttributeKey, CanonicalProfile, ProfileOrigin, Reading,
///     SampleInput, TraitValue, WeightProfile};
///
/// let weights = WeightProfile::new(vec![(AttributeKey::Catalase, 3)]).unwrap();
/// let profile = CanonicalProfile::new("Staphylococcus aureus", ProfileOrigin::Reference)
///     .with_value(AttributeKey::Catalase, TraitValue::Categorical(Reading::Positive));
/// let sample = SampleInput::new("S1").with_value(AttributeKey::Catalase, "+");
///
/// let result = score(&sample, &profile, &weights);
/// assert_eq!(result.percentage, 100.0);
/// ```
#[must_use]
pub fn score(sample: &SampleInput, profile: &CanonicalProfile, weights: &WeightProfile) -> Similarity {
    let mut total = 0.0;
    let mut max_possible: u32 = 0;
    let mut details = Vec::with_capacity(weights.len());

    for (key, weight) in weights.iter() {
        max_possible += u32::from(weight);

        let input = sample.value(key);
        let reference = profile.value(key);
        let (verdict, credit) = match key.kind() {
            TraitKind::Range => compare_range(input, reference.as_interval()),
            TraitKind::Categorical => compare_categorical(input, reference.as_reading()),
        };
        let contribution = f64::from(weight) * credit;
        total += contribution;

        details.push(ComparisonDetail {
            key,
            input: input.map(str::to_string),
            reference,
            weight,
            verdict,
            contribution,
        });
    }

    let percentage = if max_possible > 0 {
        total / f64::from(max_possible) * 100.0
    } else {
        0.0
    };
    Similarity {
        percentage,
        score: total,
        max_possible,
        details,
    }
}

/// Verdict and credit factor in `[0, 1]` for a range key.
fn compare_range(input: Option<&str>, reference: Option<&Interval>) -> (Verdict, f64) {
    let (Some(sample), Some(reference)) = (input.and_then(parse_range_str), reference) else {
        return (Verdict::Unknown, 0.0);
    };
    let ratio = sample.overlap_ratio(reference);
    let verdict = if ratio >= RANGE_MATCH_RATIO {
        Verdict::Match
    } else if ratio > RANGE_PARTIAL_RATIO {
        Verdict::Partial
    } else {
        Verdict::Mismatch
    };
    (verdict, ratio)
}

/// Verdict and credit factor in `[0, 1]` for a categorical key.
fn compare_categorical(input: Option<&str>, reference: Option<&Reading>) -> (Verdict, f64) {
    let sample = normalize(input);
    let Some(reference) = reference else {
        return (Verdict::Unknown, 0.0);
    };
    if sample.is_unknown() || reference.is_unknown() {
        return (Verdict::Unknown, 0.0);
    }
    if sample.is_variable() || reference.is_variable() {
        return (Verdict::Partial, VARIABLE_CREDIT);
    }
    if sample == *reference {
        (Verdict::Match, 1.0)
    } else {
        (Verdict::Mismatch, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::WeightPreset;
    use crate::profile::ProfileOrigin;

    fn three_key_weights() -> WeightProfile {
        WeightProfile::new(vec![
            (AttributeKey::GramStain, 3),
            (AttributeKey::Catalase, 3),
            (AttributeKey::Oxidase, 3),
        ])
        .unwrap()
    }

    fn sample() -> SampleInput {
        SampleInput::new("S1")
            .with_value(AttributeKey::GramStain, "+")
            .with_value(AttributeKey::Catalase, "positive")
            .with_value(AttributeKey::Oxidase, "-")
    }

    fn cat(r: Reading) -> TraitValue {
        TraitValue::Categorical(r)
    }

    #[test]
    fn test_full_match() {
        let profile = CanonicalProfile::new("Staphylococcus aureus", ProfileOrigin::Reference)
            .with_value(AttributeKey::GramStain, cat(Reading::Positive))
            .with_value(AttributeKey::Catalase, cat(Reading::Positive))
            .with_value(AttributeKey::Oxidase, cat(Reading::Negative));
        let result = score(&sample(), &profile, &three_key_weights());
        assert!((result.percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.count(Verdict::Match), 3);
        assert_eq!(result.details.len(), 3);
    }

    #[test]
    fn test_unknown_reference_still_counts_in_denominator() {
        let profile = CanonicalProfile::new("Staphylococcus aureus", ProfileOrigin::Reference)
            .with_value(AttributeKey::GramStain, cat(Reading::Positive))
            .with_value(AttributeKey::Catalase, cat(Reading::Positive))
            .with_value(AttributeKey::Oxidase, cat(Reading::Unknown));
        let result = score(&sample(), &profile, &three_key_weights());
        assert_eq!(result.max_possible, 9);
        assert!((result.score - 6.0).abs() < f64::EPSILON);
        assert_eq!(result.details[2].verdict, Verdict::Unknown);
        assert!((result.percentage - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", result.percentage), "66.67");
    }

    #[test]
    fn test_variable_earns_half_credit() {
        let weights = WeightProfile::new(vec![(AttributeKey::Indole, 2)]).unwrap();
        let profile = CanonicalProfile::new("x", ProfileOrigin::External)
            .with_value(AttributeKey::Indole, cat(Reading::Variable));
        let s = SampleInput::new("S").with_value(AttributeKey::Indole, "+");
        let result = score(&s, &profile, &weights);
        assert_eq!(result.details[0].verdict, Verdict::Partial);
        assert!((result.score - 1.0).abs() < f64::EPSILON);
        assert!((result.percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mismatch_and_free_text() {
        let weights = WeightProfile::new(vec![(AttributeKey::Motility, 1), (AttributeKey::Glucose, 1)]).unwrap();
        let profile = CanonicalProfile::new("x", ProfileOrigin::External)
            .with_value(AttributeKey::Motility, cat(Reading::Text("motile".into())))
            .with_value(AttributeKey::Glucose, cat(Reading::Negative));
        let s = SampleInput::new("S")
            .with_value(AttributeKey::Motility, " Motile ")
            .with_value(AttributeKey::Glucose, "acid");
        let result = score(&s, &profile, &weights);
        assert_eq!(result.details[0].verdict, Verdict::Match);
        assert_eq!(result.details[1].verdict, Verdict::Mismatch);
        assert!((result.percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_range_verdicts() {
        let weights = WeightProfile::new(vec![(AttributeKey::TemperatureRange, 2)]).unwrap();
        let profile = CanonicalProfile::new("x", ProfileOrigin::External)
            .with_value(AttributeKey::TemperatureRange, TraitValue::Range(Interval::new(20.0, 40.0)));

        let run = |raw: &str| {
            let s = SampleInput::new("S").with_value(AttributeKey::TemperatureRange, raw);
            score(&s, &profile, &weights).details.remove(0)
        };

        let full = run("20-40");
        assert_eq!(full.verdict, Verdict::Match);
        assert!((full.contribution - 2.0).abs() < f64::EPSILON);

        let half = run("30-50");
        assert_eq!(half.verdict, Verdict::Partial);
        assert!((half.contribution - 2.0 * 10.0 / 30.0).abs() < 1e-12);

        assert_eq!(run("45-60").verdict, Verdict::Mismatch);
        assert_eq!(run("warm").verdict, Verdict::Unknown);
        assert_eq!(run("warm").contribution, 0.0);
    }

    #[test]
    fn test_range_reference_missing_is_unknown() {
        let weights = WeightProfile::new(vec![(AttributeKey::PhRange, 1)]).unwrap();
        let profile = CanonicalProfile::new("x", ProfileOrigin::External);
        let s = SampleInput::new("S").with_value(AttributeKey::PhRange, "5-8");
        let result = score(&s, &profile, &weights);
        assert_eq!(result.details[0].verdict, Verdict::Unknown);
        assert_eq!(result.max_possible, 1);
        assert_eq!(result.percentage, 0.0);
    }

    #[test]
    fn test_zero_weights_give_zero_percentage() {
        let weights = WeightProfile::new(vec![(AttributeKey::Catalase, 0)]).unwrap();
        let profile = CanonicalProfile::new("x", ProfileOrigin::External)
            .with_value(AttributeKey::Catalase, cat(Reading::Positive));
        let s = SampleInput::new("S").with_value(AttributeKey::Catalase, "+");
        let result = score(&s, &profile, &weights);
        assert_eq!(result.max_possible, 0);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.details[0].verdict, Verdict::Match);
    }

    #[test]
    fn test_denominator_is_weight_total() {
        let weights = WeightPreset::Standard.profile();
        let result = score(&SampleInput::new("empty"), &CanonicalProfile::new("x", ProfileOrigin::External), &weights);
        assert_eq!(result.max_possible, weights.total());
        assert_eq!(result.details.len(), weights.len());
        assert!(result.details.iter().all(|d| d.verdict == Verdict::Unknown));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let profile = CanonicalProfile::new("x", ProfileOrigin::External)
            .with_value(AttributeKey::Catalase, cat(Reading::Variable));
        let weights = WeightPreset::Uniform.profile();
        let a = score(&sample(), &profile, &weights);
        let b = score(&sample(), &profile, &weights);
        assert_eq!(a.percentage.to_bits(), b.percentage.to_bits());
        assert_eq!(a.details, b.details);
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_percentage(100.0), ConfidenceBand::Perfect);
        assert_eq!(ConfidenceBand::from_percentage(95.0), ConfidenceBand::Perfect);
        assert_eq!(ConfidenceBand::from_percentage(94.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_percentage(60.0), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_percentage(40.0), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_percentage(0.0), ConfidenceBand::NoMatch);
        assert!(ConfidenceBand::Perfect > ConfidenceBand::High);
    }
}
