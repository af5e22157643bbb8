use chrono::NaiveDate;
use serde::Serialize;

/// One input row exactly as loaded. Quantity and price stay as raw text so
/// the cleaning stage owns every numeric repair decision.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub transaction_id: Option<String>,
    pub date: String,
    pub category: String,
    pub product: String,
    pub quantity: Option<String>,
    pub price: Option<String>,
}

/// A record after cleaning: quantity defaulted, price imputed or the record
/// dropped. The date is still text; derivation parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub transaction_id: Option<String>,
    pub date: String,
    pub category: String,
    pub product: String,
    pub quantity: f64,
    pub price: f64,
}

/// Fully derived record as persisted to the `transactions` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub transaction_id: Option<String>,
    pub date: NaiveDate,
    pub category: String,
    pub product: String,
    pub quantity: f64,
    pub price: f64,
    pub total_sales: f64,
    pub day_of_week: String,
    pub high_volume: bool,
    pub z_score: f64,
    pub outlier: bool,
}

/// One summary row per category, persisted to `aggregated_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub category: String,
    pub average_price: f64,
    pub total_revenue: f64,
    pub day_with_highest_sales: String,
}

/// Counts describing what a run did, returned to the caller and optionally
/// written as JSON via `run --report`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Rows read from the input file.
    pub rows_loaded: usize,
    /// Rows dropped because their whole category had no usable price.
    pub rows_dropped: usize,
    /// Rows written to the `transactions` table.
    pub transactions: usize,
    /// Rows written to the `aggregated_metrics` table.
    pub categories: usize,
    /// Rows written to the `outliers` table.
    pub outliers: usize,
}
