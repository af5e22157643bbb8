//! Ingestion stage: reads the raw tabular input into ordered [`RawRecord`]s.
//!
//! The loader validates presence of the required columns and nothing else;
//! malformed quantity/price values pass through untouched for the cleaning
//! stage to repair.

use std::{fs::File, path::Path};

use crate::{error::PipelineError, io_utils, record::RawRecord};

pub const REQUIRED_COLUMNS: [&str; 5] = ["date", "category", "product", "quantity", "price"];
pub const OPTIONAL_ID_COLUMN: &str = "transaction_id";

/// Column positions resolved from the header row. Lookup is by name, so
/// column order in the input file does not matter.
struct ColumnLayout {
    transaction_id: Option<usize>,
    date: usize,
    category: usize,
    product: usize,
    quantity: usize,
    price: usize,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, PipelineError> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        let required = |name: &'static str| {
            position(name)
                .ok_or_else(|| PipelineError::Input(format!("required column '{name}' not found")))
        };
        Ok(ColumnLayout {
            transaction_id: position(OPTIONAL_ID_COLUMN),
            date: required("date")?,
            category: required("category")?,
            product: required("product")?,
            quantity: required("quantity")?,
            price: required("price")?,
        })
    }
}

/// Loads every row of `path` in input order. `limit` caps the number of
/// rows read when set to a nonzero value.
pub fn load_records(
    path: &Path,
    delimiter: u8,
    limit: Option<usize>,
) -> Result<Vec<RawRecord>, PipelineError> {
    let file = File::open(path)
        .map_err(|err| PipelineError::Input(format!("cannot open input file {path:?}: {err}")))?;
    let mut reader = io_utils::open_csv_reader_from_file(file, delimiter);
    let headers = reader
        .headers()
        .map_err(|err| PipelineError::Input(format!("cannot read header row of {path:?}: {err}")))?
        .clone();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        if limit.is_some_and(|limit| row_idx >= limit) {
            break;
        }
        let row = result?;
        records.push(RawRecord {
            transaction_id: layout.transaction_id.and_then(|idx| optional_cell(&row, idx)),
            date: cell(&row, layout.date),
            category: cell(&row, layout.category),
            product: cell(&row, layout.product),
            quantity: optional_cell(&row, layout.quantity),
            price: optional_cell(&row, layout.price),
        });
    }
    Ok(records)
}

fn cell(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or("").trim().to_string()
}

fn optional_cell(row: &csv::StringRecord, idx: usize) -> Option<String> {
    row.get(idx)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
