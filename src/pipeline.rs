//! Orchestration of the six batch stages.
//!
//! The flow is strictly linear and single-threaded: load → clean → derive
//! → flag outliers → aggregate → persist. A fatal error aborts the run;
//! because every write happens at the end inside one transaction, an
//! aborted run never disturbs the previous run's tables.

use std::path::Path;

use log::{info, warn};

use crate::{
    aggregate::aggregate_by_category,
    clean::clean_records,
    error::PipelineError,
    features::derive_features,
    loader::load_records,
    outliers::flag_outliers,
    record::{CategoryMetrics, RunReport, TransactionRecord},
    store::Store,
};

/// Runs the in-memory stages only: everything up to and including
/// aggregation, with no persistence. Used by the `preview` command and by
/// [`run_pipeline`].
pub fn build_results(
    input: &Path,
    delimiter: u8,
    limit: Option<usize>,
) -> Result<(Vec<TransactionRecord>, Vec<CategoryMetrics>, RunReport), PipelineError> {
    let raw = load_records(input, delimiter, limit)?;
    info!("Loaded {} row(s) from {:?}", raw.len(), input);
    let rows_loaded = raw.len();

    let (clean, dropped) = clean_records(raw);
    if dropped > 0 {
        warn!("Dropped {dropped} row(s) with no usable price in their category");
    }
    info!("Cleaned {} row(s) ({} dropped)", clean.len(), dropped);

    let mut records = derive_features(clean)?;
    flag_outliers(&mut records);
    let outlier_count = records.iter().filter(|record| record.outlier).count();
    info!(
        "Derived features for {} record(s); {} flagged as outlier(s)",
        records.len(),
        outlier_count
    );

    let metrics = aggregate_by_category(&records);
    info!("Aggregated {} categor(ies)", metrics.len());

    let report = RunReport {
        rows_loaded,
        rows_dropped: dropped,
        transactions: records.len(),
        categories: metrics.len(),
        outliers: outlier_count,
    };
    Ok((records, metrics, report))
}

/// Runs the full pipeline end to end and persists the three result tables.
pub fn run_pipeline(
    input: &Path,
    delimiter: u8,
    limit: Option<usize>,
    db_path: &Path,
) -> Result<RunReport, PipelineError> {
    let (records, metrics, report) = build_results(input, delimiter, limit)?;
    let mut store = Store::open(db_path)?;
    store.replace_all(&records, &metrics)?;
    info!(
        "Persisted {} transaction(s), {} categor(ies), {} outlier(s) to {:?}",
        report.transactions, report.categories, report.outliers, db_path
    );
    Ok(report)
}
