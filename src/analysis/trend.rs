//! Monthly average-rating trend.

use crate::amazon::models::Review;
use crate::analysis::models::TrendPoint;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Groups dated reviews by calendar month and averages their ratings.
///
/// Undated reviews are left out. Months come back in chronological order.
pub fn rating_trend(reviews: &[Review]) -> Vec<TrendPoint> {
    let mut months: BTreeMap<(i32, u32), (u32, usize)> = BTreeMap::new();

    for review in reviews {
        let Some(date) = review.date else { continue };
        let bucket = months.entry((date.year(), date.month())).or_insert((0, 0));
        bucket.0 += u32::from(review.rating);
        bucket.1 += 1;
    }

    months
        .into_iter()
        .map(|((year, month), (sum, count))| TrendPoint {
            month: format!("{:04}-{:02}", year, month),
            average_rating: f64::from(sum) / count as f64,
            reviews: count,
        })
        .collect()
}
