//! Aggregation stage: one [`CategoryMetrics`] row per distinct category.

use itertools::Itertools;

use crate::{
    data::{WEEKDAYS, weekday_index},
    record::{CategoryMetrics, TransactionRecord},
};

/// Computes per-category metrics from the final record set. Output rows are
/// sorted by category name so reruns produce byte-identical tables.
pub fn aggregate_by_category(records: &[TransactionRecord]) -> Vec<CategoryMetrics> {
    let groups = records
        .iter()
        .map(|record| (record.category.as_str(), record))
        .into_group_map();

    groups
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(category, group)| {
            let total_revenue: f64 = group.iter().map(|record| record.total_sales).sum();
            let price_sum: f64 = group.iter().map(|record| record.price).sum();
            CategoryMetrics {
                category: category.to_string(),
                average_price: price_sum / group.len() as f64,
                total_revenue,
                day_with_highest_sales: modal_weekday(&group).to_string(),
            }
        })
        .collect()
}

/// Most frequent `day_of_week` in the group; ties break in calendar order,
/// Monday before Tuesday through Sunday, never by insertion order.
fn modal_weekday(group: &[&TransactionRecord]) -> &'static str {
    let mut counts = [0usize; 7];
    for record in group {
        if let Some(idx) = weekday_index(&record.day_of_week) {
            counts[idx] += 1;
        }
    }
    let (best, _) = counts
        .iter()
        .enumerate()
        .max_by(|(idx_a, count_a), (idx_b, count_b)| {
            // Earlier weekday wins a count tie, so compare indexes reversed.
            count_a.cmp(count_b).then(idx_b.cmp(idx_a))
        })
        .unwrap_or((0, &0));
    WEEKDAYS[best]
}
