//! SQLite persistence layer.
//!
//! Only this module talks to the database; pipeline stages hand it whole
//! result sets and never execute SQL themselves. Every run fully replaces
//! the three tables inside one transaction, so readers either see the
//! previous run or the new one, never a mix. Read helpers mirror the
//! queries the external dashboard service issues; all filter values are
//! bound parameters, never interpolated into query text.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, params, params_from_iter};

use crate::{
    error::PipelineError,
    record::{CategoryMetrics, TransactionRecord},
};

const SCHEMA_SQL: &str = "
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS aggregated_metrics;
DROP TABLE IF EXISTS outliers;
CREATE TABLE transactions (
    transaction_id TEXT,
    date           TEXT NOT NULL,
    category       TEXT NOT NULL,
    product        TEXT NOT NULL,
    quantity       REAL NOT NULL,
    price          REAL NOT NULL,
    total_sales    REAL NOT NULL,
    day_of_week    TEXT NOT NULL,
    high_volume    INTEGER NOT NULL,
    z_score        REAL NOT NULL,
    outlier        INTEGER NOT NULL
);
CREATE TABLE aggregated_metrics (
    category               TEXT NOT NULL PRIMARY KEY,
    average_price          REAL NOT NULL,
    total_revenue          REAL NOT NULL,
    day_with_highest_sales TEXT NOT NULL
);
CREATE TABLE outliers (
    transaction_id TEXT,
    date           TEXT NOT NULL,
    category       TEXT NOT NULL,
    product        TEXT NOT NULL,
    z_score        REAL NOT NULL
);
";

/// Grouped product revenue, as served by the dashboard's by-product query.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product: String,
    pub category: String,
    pub total_sales: f64,
}

/// Grouped daily revenue, as served by the dashboard's by-day query.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySales {
    pub date: NaiveDate,
    pub total_sales: f64,
}

/// Reduced projection persisted for each flagged record.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierRow {
    pub transaction_id: Option<String>,
    pub date: NaiveDate,
    pub category: String,
    pub product: String,
    pub z_score: f64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the store database at `path`.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, PipelineError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Replaces the contents of all three tables with this run's results.
    ///
    /// The drop/create/fill sequence runs in a single transaction: a failed
    /// run leaves the previous run's tables untouched.
    pub fn replace_all(
        &mut self,
        records: &[TransactionRecord],
        metrics: &[CategoryMetrics],
    ) -> Result<(), PipelineError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA_SQL)?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO transactions (transaction_id, date, category, product, quantity,
                     price, total_sales, day_of_week, high_volume, z_score, outlier)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in records {
                insert.execute(params![
                    record.transaction_id,
                    record.date,
                    record.category,
                    record.product,
                    record.quantity,
                    record.price,
                    record.total_sales,
                    record.day_of_week,
                    record.high_volume,
                    record.z_score,
                    record.outlier,
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO aggregated_metrics (category, average_price, total_revenue,
                     day_with_highest_sales)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in metrics {
                insert.execute(params![
                    row.category,
                    row.average_price,
                    row.total_revenue,
                    row.day_with_highest_sales,
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO outliers (transaction_id, date, category, product, z_score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records.iter().filter(|record| record.outlier) {
                insert.execute(params![
                    record.transaction_id,
                    record.date,
                    record.category,
                    record.product,
                    record.z_score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Revenue grouped by product, optionally narrowed to one category
    /// and/or one product.
    pub fn sales_by_product(
        &self,
        category: Option<&str>,
        product: Option<&str>,
    ) -> Result<Vec<ProductSales>, PipelineError> {
        let mut sql =
            String::from("SELECT product, category, SUM(total_sales) FROM transactions");
        let mut conditions: Vec<&str> = Vec::new();
        let mut bound: Vec<String> = Vec::new();
        if let Some(category) = category {
            conditions.push("category = ?");
            bound.push(category.to_string());
        }
        if let Some(product) = product {
            conditions.push("product = ?");
            bound.push(product.to_string());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" GROUP BY product, category ORDER BY category, product");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                Ok(ProductSales {
                    product: row.get(0)?,
                    category: row.get(1)?,
                    total_sales: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Revenue grouped by calendar date, optionally limited to an inclusive
    /// date range.
    pub fn sales_by_day(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DaySales>, PipelineError> {
        let mut sql = String::from("SELECT date, SUM(total_sales) FROM transactions");
        let mut conditions: Vec<&str> = Vec::new();
        let mut bound: Vec<String> = Vec::new();
        if let Some(start) = start {
            conditions.push("date >= ?");
            bound.push(start.format("%Y-%m-%d").to_string());
        }
        if let Some(end) = end {
            conditions.push("date <= ?");
            bound.push(end.format("%Y-%m-%d").to_string());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" GROUP BY date ORDER BY date");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                Ok(DaySales {
                    date: row.get(0)?,
                    total_sales: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Passthrough of the `aggregated_metrics` table.
    pub fn aggregated_metrics(&self) -> Result<Vec<CategoryMetrics>, PipelineError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, average_price, total_revenue, day_with_highest_sales
             FROM aggregated_metrics ORDER BY category",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryMetrics {
                    category: row.get(0)?,
                    average_price: row.get(1)?,
                    total_revenue: row.get(2)?,
                    day_with_highest_sales: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Passthrough of the `outliers` table.
    pub fn outliers(&self) -> Result<Vec<OutlierRow>, PipelineError> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id, date, category, product, z_score FROM outliers",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OutlierRow {
                    transaction_id: row.get(0)?,
                    date: row.get(1)?,
                    category: row.get(2)?,
                    product: row.get(3)?,
                    z_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of rows currently in `transactions`.
    pub fn transaction_count(&self) -> Result<usize, PipelineError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        id: &str,
        date: (i32, u32, u32),
        category: &str,
        product: &str,
        quantity: f64,
        price: f64,
        z_score: f64,
        outlier: bool,
    ) -> TransactionRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        TransactionRecord {
            transaction_id: Some(id.to_string()),
            date,
            category: category.to_string(),
            product: product.to_string(),
            quantity,
            price,
            total_sales: quantity * price,
            day_of_week: crate::data::weekday_name(date).to_string(),
            high_volume: quantity > 10.0,
            z_score,
            outlier,
        }
    }

    fn sample_records() -> Vec<TransactionRecord> {
        vec![
            record("t1", (2024, 1, 1), "Toys", "Blocks", 2.0, 10.0, -0.5, false),
            record("t2", (2024, 1, 2), "Toys", "Doll", 3.0, 20.0, 0.1, false),
            record("t3", (2024, 1, 2), "Office", "Pen", 50.0, 1.5, 2.4, true),
        ]
    }

    fn sample_metrics() -> Vec<CategoryMetrics> {
        vec![
            CategoryMetrics {
                category: "Office".to_string(),
                average_price: 1.5,
                total_revenue: 75.0,
                day_with_highest_sales: "Tuesday".to_string(),
            },
            CategoryMetrics {
                category: "Toys".to_string(),
                average_price: 15.0,
                total_revenue: 80.0,
                day_with_highest_sales: "Monday".to_string(),
            },
        ]
    }

    #[test]
    fn replace_all_is_a_full_replacement() {
        let mut store = Store::in_memory().expect("open");
        store
            .replace_all(&sample_records(), &sample_metrics())
            .expect("first run");
        assert_eq!(store.transaction_count().expect("count"), 3);

        // A second, smaller run must not merge or append.
        let only = vec![record("t9", (2024, 2, 1), "Toys", "Kite", 1.0, 5.0, 0.0, false)];
        store.replace_all(&only, &[]).expect("second run");
        assert_eq!(store.transaction_count().expect("count"), 1);
        assert!(store.aggregated_metrics().expect("metrics").is_empty());
        assert!(store.outliers().expect("outliers").is_empty());
    }

    #[test]
    fn outliers_table_holds_exactly_the_flagged_subset() {
        let mut store = Store::in_memory().expect("open");
        store
            .replace_all(&sample_records(), &sample_metrics())
            .expect("persist");
        let outliers = store.outliers().expect("outliers");
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].transaction_id.as_deref(), Some("t3"));
        assert_eq!(outliers[0].category, "Office");
        assert_eq!(outliers[0].z_score, 2.4);
    }

    #[test]
    fn sales_by_product_applies_bound_filters() {
        let mut store = Store::in_memory().expect("open");
        store
            .replace_all(&sample_records(), &sample_metrics())
            .expect("persist");

        let all = store.sales_by_product(None, None).expect("query");
        assert_eq!(all.len(), 3);

        let toys = store.sales_by_product(Some("Toys"), None).expect("query");
        assert_eq!(toys.len(), 2);
        assert!(toys.iter().all(|row| row.category == "Toys"));

        let doll = store
            .sales_by_product(Some("Toys"), Some("Doll"))
            .expect("query");
        assert_eq!(doll.len(), 1);
        assert_eq!(doll[0].total_sales, 60.0);

        // A value that only makes sense as data must never act as SQL.
        let hostile = store
            .sales_by_product(Some("Toys' OR '1'='1"), None)
            .expect("query");
        assert!(hostile.is_empty());
    }

    #[test]
    fn sales_by_day_honors_inclusive_date_range() {
        let mut store = Store::in_memory().expect("open");
        store
            .replace_all(&sample_records(), &sample_metrics())
            .expect("persist");

        let all = store.sales_by_day(None, None).expect("query");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(all[0].total_sales, 20.0);
        // Jan 2 groups the Doll and Pen rows together.
        assert_eq!(all[1].total_sales, 60.0 + 75.0);

        let second_day_only = store
            .sales_by_day(NaiveDate::from_ymd_opt(2024, 1, 2), None)
            .expect("query");
        assert_eq!(second_day_only.len(), 1);

        let first_day_only = store
            .sales_by_day(None, NaiveDate::from_ymd_opt(2024, 1, 1))
            .expect("query");
        assert_eq!(first_day_only.len(), 1);
        assert_eq!(first_day_only[0].total_sales, 20.0);
    }

    #[test]
    fn aggregated_metrics_round_trip() {
        let mut store = Store::in_memory().expect("open");
        let metrics = sample_metrics();
        store.replace_all(&sample_records(), &metrics).expect("persist");
        assert_eq!(store.aggregated_metrics().expect("metrics"), metrics);
    }
}
