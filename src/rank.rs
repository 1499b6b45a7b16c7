//! Ranking of scored candidates.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attribute::WeightProfile;
use crate::profile::{CanonicalProfile, ProfileOrigin};
use crate::sample::SampleInput;
use crate::score::{score, ComparisonDetail, ConfidenceBand};

/// What to do with candidates that scored exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroScorePolicy {
    /// Rank every candidate.
    #[default]
    Keep,
    /// Discard zero-score noise before ranking.
    Drop,
}

/// Ranking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub zero_scores: ZeroScorePolicy,
    /// Score candidates on the rayon pool.
    pub parallel: bool,
    /// Truncate the ranking after this many candidates.
    pub max_results: Option<usize>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            zero_scores: ZeroScorePolicy::Keep,
            parallel: true,
            max_results: None,
        }
    }
}

/// One ranked identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate_id: String,
    pub name: String,
    pub origin: ProfileOrigin,
    /// Similarity in `[0, 100]`, unrounded.
    pub percentage: f64,
    pub score: f64,
    pub max_possible: u32,
    pub band: ConfidenceBand,
    /// 1-based position after sorting.
    pub rank: usize,
    pub details: Vec<ComparisonDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScoredCandidate {
    fn from_profile(id: &str, profile: &CanonicalProfile, sample: &SampleInput, weights: &WeightProfile) -> Self {
        let similarity = score(sample, profile, weights);
        Self {
            candidate_id: id.to_string(),
            name: profile.name.clone(),
            origin: profile.origin,
            percentage: similarity.percentage,
            score: similarity.score,
            max_possible: similarity.max_possible,
            band: ConfidenceBand::from_percentage(similarity.percentage),
            rank: 0,
            details: similarity.details,
            description: profile.description.clone(),
        }
    }
}

/// Scores `sample` against every candidate and ranks the results.
///
/// Candidates are stable-sorted by percentage, descending, so ties keep
/// their input order. Profiles whose name failed to resolve are skipped.
#[must_use]
pub fn rank_candidates(
    sample: &SampleInput,
    candidates: &[(String, CanonicalProfile)],
    weights: &WeightProfile,
    options: &RankOptions,
) -> Vec<ScoredCandidate> {
    let score_one = |(id, profile): &(String, CanonicalProfile)| {
        if profile.is_resolved() {
            Some(ScoredCandidate::from_profile(id, profile, sample, weights))
        } else {
            debug!(candidate = %id, "skipping candidate with unresolved name");
            None
        }
    };

    let scored: Vec<Option<ScoredCandidate>> = if options.parallel {
        candidates.par_iter().map(score_one).collect()
    } else {
        candidates.iter().map(score_one).collect()
    };

    let mut ranked: Vec<ScoredCandidate> = scored
        .into_iter()
        .flatten()
        .filter(|c| options.zero_scores == ZeroScorePolicy::Keep || c.percentage > 0.0)
        .collect();

    ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    if let Some(limit) = options.max_results {
        ranked.truncate(limit);
    }
    for (i, candidate) in ranked.iter_mut().enumerate() {
        candidate.rank = i + 1;
    }

    info!(
        sample = %sample.label,
        candidates = candidates.len(),
        ranked = ranked.len(),
        best = ranked.first().map_or(0.0, |c| c.percentage),
        "ranked candidates"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKey;
    use crate::normalize::Reading;
    use crate::profile::{TraitValue, UNKNOWN_SPECIES};

    fn weights() -> WeightProfile {
        WeightProfile::new(vec![
            (AttributeKey::Catalase, 1),
            (AttributeKey::Oxidase, 1),
            (AttributeKey::Indole, 1),
            (AttributeKey::Urease, 1),
            (AttributeKey::Citrate, 1),
            (AttributeKey::Glucose, 1),
            (AttributeKey::Lactose, 1),
            (AttributeKey::Sucrose, 1),
            (AttributeKey::Mannitol, 1),
            (AttributeKey::Sorbitol, 1),
            (AttributeKey::Xylose, 1),
            (AttributeKey::Maltose, 1),
            (AttributeKey::Fructose, 1),
            (AttributeKey::Raffinose, 1),
            (AttributeKey::Trehalose, 1),
            (AttributeKey::Arabinose, 1),
            (AttributeKey::Inositol, 1),
            (AttributeKey::DNase, 1),
            (AttributeKey::Gelatinase, 1),
            (AttributeKey::Motility, 1),
        ])
        .unwrap()
    }

    /// A sample that is positive for every weighted key.
    fn all_positive() -> SampleInput {
        weights()
            .iter()
            .fold(SampleInput::new("S"), |s, (key, _)| s.with_value(key, "+"))
    }

    /// A profile positive for the first `n` weighted keys, negative for the rest.
    fn profile(name: &str, n: usize) -> CanonicalProfile {
        weights()
            .iter()
            .enumerate()
            .fold(CanonicalProfile::new(name, ProfileOrigin::External), |p, (i, (key, _))| {
                let r = if i < n { Reading::Positive } else { Reading::Negative };
                p.with_value(key, TraitValue::Categorical(r))
            })
    }

    fn candidates() -> Vec<(String, CanonicalProfile)> {
        vec![
            ("a".into(), profile("First eighty", 16)),
            ("b".into(), profile("Ninety-five", 19)),
            ("c".into(), profile("Second eighty", 16)),
        ]
    }

    #[test]
    fn test_stable_descending_ranking() {
        for parallel in [false, true] {
            let options = RankOptions { parallel, ..RankOptions::default() };
            let ranked = rank_candidates(&all_positive(), &candidates(), &weights(), &options);
            let ids: Vec<&str> = ranked.iter().map(|c| c.candidate_id.as_str()).collect();
            assert_eq!(ids, vec!["b", "a", "c"]);
            assert_eq!(ranked.iter().map(|c| c.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
            assert!((ranked[0].percentage - 95.0).abs() < 1e-9);
            assert!((ranked[1].percentage - 80.0).abs() < 1e-9);
            assert_eq!(ranked[0].band, ConfidenceBand::Perfect);
            assert_eq!(ranked[1].band, ConfidenceBand::High);
        }
    }

    #[test]
    fn test_zero_score_policy() {
        let mut set = candidates();
        set.push(("z".into(), profile("All negative", 0)));

        let kept = rank_candidates(&all_positive(), &set, &weights(), &RankOptions::default());
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[3].candidate_id, "z");
        assert_eq!(kept[3].percentage, 0.0);

        let options = RankOptions { zero_scores: ZeroScorePolicy::Drop, ..RankOptions::default() };
        let dropped = rank_candidates(&all_positive(), &set, &weights(), &options);
        assert_eq!(dropped.len(), 3);
        assert!(dropped.iter().all(|c| c.candidate_id != "z"));
    }

    #[test]
    fn test_unresolved_and_truncation() {
        let mut set = candidates();
        set.insert(0, ("u".into(), profile(UNKNOWN_SPECIES, 20)));
        let options = RankOptions { max_results: Some(2), ..RankOptions::default() };
        let ranked = rank_candidates(&all_positive(), &set, &weights(), &options);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.candidate_id != "u"));
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(rank_candidates(&all_positive(), &[], &weights(), &RankOptions::default()).is_empty());
    }
}
