use proptest::prelude::*;

use bactident::{
    normalize, parse_range, score, AttributeKey, CanonicalProfile, Interval, ProfileOrigin, RawValue, Reading,
    SampleInput, TraitValue, WeightProfile,
};

fn case_permuted(word: &'static str) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
        word.chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
            .collect()
    })
}

fn interval() -> impl Strategy<Value = Interval> {
    (-50.0f64..150.0, -50.0f64..150.0).prop_filter_map("finite", |(a, b)| Interval::new(a, b))
}

fn reading() -> impl Strategy<Value = Reading> {
    prop_oneof![
        Just(Reading::Positive),
        Just(Reading::Negative),
        Just(Reading::Variable),
        Just(Reading::Unknown),
    ]
}

fn raw_cell() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        Just("+".to_string()),
        Just("-".to_string()),
        Just("+/-".to_string()),
        Just("10-40".to_string()),
        "[a-z ]{0,8}",
    ])
}

fn weights() -> impl Strategy<Value = WeightProfile> {
    proptest::sample::subsequence(AttributeKey::ALL.to_vec(), 1..AttributeKey::ALL.len())
        .prop_flat_map(|keys| {
            let n = keys.len();
            (Just(keys), proptest::collection::vec(0u8..=3, n))
        })
        .prop_map(|(keys, ws)| WeightProfile::new(keys.into_iter().zip(ws).collect()).unwrap())
}

proptest! {
    #[test]
    fn positive_synonyms_any_case(word in prop_oneof![case_permuted("pos"), case_permuted("positive"), case_permuted("yes")]) {
        prop_assert_eq!(normalize(Some(&word)), Reading::Positive);
    }

    #[test]
    fn negative_synonyms_any_case(word in prop_oneof![case_permuted("neg"), case_permuted("negative"), case_permuted("no")]) {
        prop_assert_eq!(normalize(Some(&word)), Reading::Negative);
    }

    #[test]
    fn normalizer_is_total(text in ".*") {
        let reading = normalize(Some(&text));
        if text.trim().is_empty() {
            prop_assert_eq!(reading, Reading::Unknown);
        }
    }

    #[test]
    fn overlap_ratio_bounded_and_symmetric(a in interval(), b in interval()) {
        let ab = a.overlap_ratio(&b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((ab - b.overlap_ratio(&a)).abs() < 1e-12);
        if a.length() > 0.0 {
            prop_assert!((a.overlap_ratio(&a) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn parse_range_never_panics(text in ".*") {
        if let Some(iv) = parse_range(&RawValue::from(text)) {
            prop_assert!(iv.min <= iv.max);
        }
    }

    #[test]
    fn score_is_bounded_and_complete(
        weights in weights(),
        cells in proptest::collection::vec(raw_cell(), AttributeKey::ALL.len()),
        readings in proptest::collection::vec(reading(), AttributeKey::ALL.len()),
        ranges in proptest::collection::vec(prop::option::of(interval()), AttributeKey::ALL.len()),
    ) {
        let mut sample = SampleInput::new("p");
        let mut profile = CanonicalProfile::new("Candidate", ProfileOrigin::External);
        for (i, &key) in AttributeKey::ALL.iter().enumerate() {
            if let Some(cell) = &cells[i] {
                sample = sample.with_value(key, cell.clone());
            }
            let value = if key.is_range() {
                TraitValue::Range(ranges[i])
            } else {
                TraitValue::Categorical(readings[i].clone())
            };
            profile = profile.with_value(key, value);
        }

        let first = score(&sample, &profile, &weights);
        prop_assert_eq!(first.max_possible, weights.total());
        prop_assert_eq!(first.details.len(), weights.len());
        prop_assert!((0.0..=100.0).contains(&first.percentage));
        prop_assert!(first.score <= f64::from(first.max_possible) + 1e-9);

        let second = score(&sample, &profile, &weights);
        prop_assert_eq!(first.percentage.to_bits(), second.percentage.to_bits());
        prop_assert_eq!(first.details, second.details);
    }
}
