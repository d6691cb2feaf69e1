use proptest::prelude::*;

use amz_reviews::amazon::dates;
use amz_reviews::analysis::{reconcile, Confidence};
use amz_reviews::{Histogram, Review, ReviewCollection};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Five bar percents that sum to at most 100, as on a real page.
fn arb_page_histogram() -> impl Strategy<Value = Histogram> {
    prop::collection::vec(0u32..=100, 5).prop_map(|raw| {
        let mut budget = 100u32;
        let pairs: Vec<(u8, u32)> = raw
            .into_iter()
            .zip((1u8..=5).rev())
            .map(|(pct, star)| {
                let pct = pct.min(budget);
                budget -= pct;
                (star, pct)
            })
            .collect();
        Histogram::from_pairs(pairs)
    })
}

/// Any per-star percents, including sums a page would never show.
fn arb_any_histogram() -> impl Strategy<Value = Histogram> {
    prop::collection::vec((1u8..=5, 0u32..=100), 0..6).prop_map(Histogram::from_pairs)
}

fn arb_review_text() -> impl Strategy<Value = String> {
    "[ a-zA-Z!.]{0,40}"
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reconciled_counts_sum_to_total(histogram in arb_any_histogram(), total in 0u32..100_000) {
        let result = reconcile(Some(&histogram), total);
        prop_assert_eq!(result.counts.total(), i64::from(total));
    }

    #[test]
    fn page_histograms_never_go_negative(histogram in arb_page_histogram(), total in 0u32..100_000) {
        let result = reconcile(Some(&histogram), total);
        prop_assert!(result.counts.positive >= 0);
        prop_assert!(result.counts.neutral >= 0);
        prop_assert!(result.counts.negative >= 0);
    }

    #[test]
    fn missing_histogram_is_heuristic(total in 0u32..100_000) {
        let result = reconcile(None, total);
        prop_assert_eq!(result.confidence, Confidence::Heuristic);
        prop_assert_eq!(result.counts.total(), i64::from(total));
        prop_assert!(result.counts.negative >= 0);
    }
}

// ---------------------------------------------------------------------------
// Collection and parsing
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn collection_never_exceeds_capacity(
        capacity in 0usize..20,
        texts in prop::collection::vec(arb_review_text(), 0..40),
    ) {
        let mut collection = ReviewCollection::new(capacity);
        for text in texts {
            collection.push(Review::new(Some(3), text, None, 0.0));
        }
        prop_assert!(collection.len() <= capacity);
    }

    #[test]
    fn date_normalization_never_panics(raw in ".{0,60}") {
        let _ = dates::normalize(&raw);
    }
}
