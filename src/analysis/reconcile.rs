//! Histogram reconciliation: percentages plus a total into exact integer counts.
//!
//! Buckets are floored and the whole rounding drift goes to `positive`. When the
//! histogram's percentages sum past 100 the drift is negative, and `positive` absorbs
//! that too, so it can end up below zero. This tie-break is kept deliberately; the
//! three counts always sum to the total.

use crate::amazon::models::Histogram;
use crate::analysis::models::{Confidence, SentimentCounts};

/// Split used when no histogram is available (positive / neutral, negative gets the rest).
pub const HEURISTIC_SPLIT: (i64, i64) = (70, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub counts: SentimentCounts,
    pub confidence: Confidence,
}

/// Converts a histogram and total review count into sentiment bucket counts.
///
/// Stars 5+4 are positive, 3 neutral, 2+1 negative. An empty (or absent) histogram
/// falls back to the fixed 70/20/10 split with [`Confidence::Heuristic`].
pub fn reconcile(histogram: Option<&Histogram>, total: u32) -> Reconciled {
    let total = i64::from(total);

    let Some(histogram) = histogram.filter(|h| !h.is_empty()) else {
        let positive = total * HEURISTIC_SPLIT.0 / 100;
        let neutral = total * HEURISTIC_SPLIT.1 / 100;
        return Reconciled {
            counts: SentimentCounts { positive, neutral, negative: total - positive - neutral },
            confidence: Confidence::Heuristic,
        };
    };

    let pct = |star: u8| i64::from(histogram.percent(star));
    let mut counts = SentimentCounts {
        positive: total * (pct(5) + pct(4)) / 100,
        neutral: total * pct(3) / 100,
        negative: total * (pct(2) + pct(1)) / 100,
    };

    let diff = total - counts.total();
    counts.positive += diff;

    Reconciled { counts, confidence: Confidence::Histogram }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_histogram() {
        let histogram = Histogram::from_pairs([(5, 50), (4, 20), (3, 10), (2, 10), (1, 10)]);
        let result = reconcile(Some(&histogram), 100);
        assert_eq!(result.counts, SentimentCounts { positive: 70, neutral: 10, negative: 20 });
        assert_eq!(result.confidence, Confidence::Histogram);
    }

    #[test]
    fn test_drift_goes_to_positive() {
        // 33/33/34 of 10 floors to 6 + 3 + 0 = 9; the missing one lands in positive
        let histogram = Histogram::from_pairs([(5, 33), (4, 33), (3, 34)]);
        let result = reconcile(Some(&histogram), 10);
        assert_eq!(result.counts, SentimentCounts { positive: 7, neutral: 3, negative: 0 });
    }

    #[test]
    fn test_partial_histogram() {
        let histogram = Histogram::from_pairs([(5, 80), (1, 20)]);
        let result = reconcile(Some(&histogram), 7);
        assert_eq!(result.counts.neutral, 0);
        assert_eq!(result.counts.negative, 1);
        assert_eq!(result.counts.total(), 7);
    }

    #[test]
    fn test_heuristic_without_histogram() {
        let result = reconcile(None, 100);
        assert_eq!(result.counts, SentimentCounts { positive: 70, neutral: 20, negative: 10 });
        assert_eq!(result.confidence, Confidence::Heuristic);

        let result = reconcile(Some(&Histogram::new()), 7);
        assert_eq!(result.counts, SentimentCounts { positive: 4, neutral: 1, negative: 2 });
        assert_eq!(result.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_zero_total() {
        let histogram = Histogram::from_pairs([(5, 100)]);
        assert_eq!(reconcile(Some(&histogram), 0).counts, SentimentCounts::default());
        assert_eq!(reconcile(None, 0).counts, SentimentCounts::default());
    }

    #[test]
    fn test_overfull_histogram_keeps_asymmetry() {
        let histogram = Histogram::from_pairs([(3, 100), (1, 100)]);
        let result = reconcile(Some(&histogram), 10);
        assert_eq!(result.counts, SentimentCounts { positive: -10, neutral: 10, negative: 10 });
        assert_eq!(result.counts.total(), 10);
    }
}
