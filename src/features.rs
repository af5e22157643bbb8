//! Derivation stage: computes `total_sales`, `day_of_week`, and
//! `high_volume` for every surviving record.
//!
//! Date parsing happens here, not at load time, so a run only fails on a
//! bad date after cleaning has had its chance to drop the row for other
//! reasons. An unparseable date is fatal for the whole run.

use crate::{
    data::{parse_naive_date, weekday_name},
    error::PipelineError,
    record::{CleanRecord, TransactionRecord},
};

pub const HIGH_VOLUME_THRESHOLD: f64 = 10.0;

pub fn derive_features(
    clean: Vec<CleanRecord>,
) -> Result<Vec<TransactionRecord>, PipelineError> {
    clean
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let date = parse_naive_date(&record.date).map_err(|_| {
                PipelineError::Input(format!(
                    "record {}: cannot parse date '{}'",
                    idx + 1,
                    record.date
                ))
            })?;
            Ok(TransactionRecord {
                transaction_id: record.transaction_id,
                date,
                category: record.category,
                product: record.product,
                quantity: record.quantity,
                price: record.price,
                total_sales: record.quantity * record.price,
                day_of_week: weekday_name(date).to_string(),
                // Strictly greater: a quantity of exactly 10 is not high-volume.
                high_volume: record.quantity > HIGH_VOLUME_THRESHOLD,
                z_score: 0.0,
                outlier: false,
            })
        })
        .collect()
}
