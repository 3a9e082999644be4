//! Property tests for media type combination and candidate ordering.

use std::cmp::Ordering;

use jersey_router::media::comparator::{compare, compare_specificity_first};
use jersey_router::media::{
    format_quality, sort_candidates, AcceptableMediaType, CombinedMediaType, EffectiveMediaType,
    MediaType, NegotiationOrder,
};
use proptest::prelude::*;

const TYPES: [(&str, &str); 7] = [
    ("*", "*"),
    ("text", "*"),
    ("text", "html"),
    ("text", "plain"),
    ("application", "*"),
    ("application", "json"),
    ("application", "xml"),
];

fn media_type() -> impl Strategy<Value = MediaType> {
    (0..TYPES.len()).prop_map(|i| MediaType::new(TYPES[i].0, TYPES[i].1))
}

fn client() -> impl Strategy<Value = AcceptableMediaType> {
    (media_type(), 0u16..=1000).prop_map(|(t, q)| AcceptableMediaType::with_quality(t, q))
}

fn server() -> impl Strategy<Value = EffectiveMediaType> {
    (media_type(), 0u16..=1000).prop_map(|(t, qs)| {
        EffectiveMediaType::new(t.with_parameter("qs", &format_quality(qs)))
            .expect("formatted quality parses")
    })
}

fn candidate() -> impl Strategy<Value = CombinedMediaType> {
    (client(), server())
        .prop_filter_map("incompatible pair", |(c, s)| CombinedMediaType::combine(&c, &s))
}

fn key(c: &CombinedMediaType) -> (u8, u32) {
    (c.distance(), c.weight())
}

proptest! {
    #[test]
    fn prop_distance_counts_wildcard_reconciliations(c in client(), s in server()) {
        match CombinedMediaType::combine(&c, &s) {
            None => prop_assert!(!c.media_type().is_compatible(s.media_type())),
            Some(combined) => {
                prop_assert!(combined.distance() <= 2);
                let same_wildcardness = c.media_type().is_wildcard_type() == s.media_type().is_wildcard_type()
                    && c.media_type().is_wildcard_subtype() == s.media_type().is_wildcard_subtype();
                prop_assert_eq!(combined.distance() == 0, same_wildcardness);
                prop_assert_eq!(combined.q(), c.quality());
                prop_assert_eq!(combined.qs(), s.quality_source());
                let either_concrete = !c.media_type().is_wildcard_subtype() || !s.media_type().is_wildcard_subtype();
                prop_assert_eq!(!combined.combined_type().is_wildcard_subtype(), either_concrete);
            }
        }
    }

    #[test]
    fn prop_comparators_are_antisymmetric(a in candidate(), b in candidate()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        prop_assert_eq!(
            compare_specificity_first(&a, &b),
            compare_specificity_first(&b, &a).reverse()
        );
        prop_assert_eq!(compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn prop_comparators_are_transitive(a in candidate(), b in candidate(), c in candidate()) {
        for cmp in [compare, compare_specificity_first] {
            if cmp(&a, &b) != Ordering::Greater && cmp(&b, &c) != Ordering::Greater {
                prop_assert_ne!(cmp(&a, &c), Ordering::Greater);
            }
            if cmp(&a, &b) == Ordering::Less && cmp(&b, &c) == Ordering::Less {
                prop_assert_eq!(cmp(&a, &c), Ordering::Less);
            }
        }
    }

    #[test]
    fn prop_sort_is_idempotent(mut candidates in prop::collection::vec(candidate(), 0..24)) {
        for order in [NegotiationOrder::Distance, NegotiationOrder::Specificity] {
            sort_candidates(&mut candidates, order);
            let once = candidates.clone();
            sort_candidates(&mut candidates, order);
            prop_assert_eq!(&once, &candidates);
            for pair in candidates.windows(2) {
                prop_assert_ne!(order.compare(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }

    #[test]
    fn prop_sort_is_independent_of_input_order(
        candidates in prop::collection::vec(candidate(), 1..24)
    ) {
        let mut forward = candidates.clone();
        let mut backward: Vec<_> = candidates.into_iter().rev().collect();
        sort_candidates(&mut forward, NegotiationOrder::Distance);
        sort_candidates(&mut backward, NegotiationOrder::Distance);
        let forward_keys: Vec<_> = forward.iter().map(key).collect();
        let backward_keys: Vec<_> = backward.iter().map(key).collect();
        prop_assert_eq!(forward_keys, backward_keys);
    }
}

#[test]
fn test_spec_examples() {
    let cases = [
        ("text/html;q=1", "text/html;qs=1", "text/html", 1000, 1000, 0),
        ("text/*;q=0.5", "text/html;qs=0.8", "text/html", 500, 800, 1),
        ("*/*;q=0.2", "text/*;qs=0.8", "text/*", 200, 800, 1),
        ("text/html;q=0.2", "*/*;qs=0.8", "text/html", 200, 800, 2),
    ];
    for (client, server, combined, q, qs, distance) in cases {
        let client: AcceptableMediaType = client.parse().unwrap();
        let server: EffectiveMediaType = server.parse().unwrap();
        let result = CombinedMediaType::combine(&client, &server).unwrap();
        assert_eq!(result.combined_type().to_string(), combined);
        assert_eq!((result.q(), result.qs(), result.distance()), (q, qs, distance));
    }
}
