//! Outlier stage: per-category z-score of `quantity` and the resulting
//! outlier flag.
//!
//! A category needs at least two records and nonzero quantity variance to
//! produce meaningful z-scores; otherwise every record in the group keeps
//! `z_score = 0` and `outlier = false`.

use std::collections::HashMap;

use crate::record::TransactionRecord;

pub const OUTLIER_Z_THRESHOLD: f64 = 2.0;

pub fn flag_outliers(records: &mut [TransactionRecord]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        groups.entry(record.category.clone()).or_default().push(idx);
    }

    for indices in groups.values() {
        let Some((mean, std_dev)) = quantity_spread(records, indices) else {
            for &idx in indices {
                records[idx].z_score = 0.0;
                records[idx].outlier = false;
            }
            continue;
        };
        for &idx in indices {
            let z = (records[idx].quantity - mean) / std_dev;
            records[idx].z_score = z;
            records[idx].outlier = z.abs() > OUTLIER_Z_THRESHOLD;
        }
    }
}

/// Mean and sample (n-1) standard deviation of `quantity` over a group, or
/// `None` when the group is too small or its spread is zero/undefined.
fn quantity_spread(records: &[TransactionRecord], indices: &[usize]) -> Option<(f64, f64)> {
    let n = indices.len();
    if n < 2 {
        return None;
    }
    let sum: f64 = indices.iter().map(|&idx| records[idx].quantity).sum();
    let sum_squares: f64 = indices
        .iter()
        .map(|&idx| records[idx].quantity * records[idx].quantity)
        .sum();
    let mean = sum / n as f64;
    let variance = (sum_squares - n as f64 * mean * mean) / (n as f64 - 1.0);
    let std_dev = variance.max(0.0).sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return None;
    }
    Some((mean, std_dev))
}
