use thiserror::Error;

/// Failure taxonomy for a pipeline run.
///
/// Only fatal conditions appear here. Data-quality repairs (defaulted
/// quantities, imputed prices, dropped rows) are absorbed locally and
/// reported through [`crate::record::RunReport`] counts instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing input file, missing required column, or an unparseable date.
    /// Aborts the run before any write occurs.
    #[error("input error: {0}")]
    Input(String),

    /// Row-level CSV read failure (malformed record, I/O error mid-file).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A write to the backing store failed. Because all table writes happen
    /// inside one transaction, prior contents survive a failed run intact.
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}
