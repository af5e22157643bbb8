//! Cleaning stage: repairs missing or invalid `quantity` and `price` cells.
//!
//! Quantity never causes a record to drop; anything unusable becomes `0`.
//! Price is coerced, then imputed from the median price of the other
//! records in the same category. A record whose whole category has no
//! usable price cannot be repaired and is removed from the set.

use std::collections::HashMap;

use crate::{
    data::coerce_number,
    record::{CleanRecord, RawRecord},
};

/// Applies the repair policy to the full record set, preserving input
/// order. Returns the surviving records and the count of dropped ones.
pub fn clean_records(raw: Vec<RawRecord>) -> (Vec<CleanRecord>, usize) {
    let coerced: Vec<(RawRecord, f64, Option<f64>)> = raw
        .into_iter()
        .map(|record| {
            let quantity = coerce_number(record.quantity.as_deref()).unwrap_or(0.0);
            let price = coerce_number(record.price.as_deref());
            (record, quantity, price)
        })
        .collect();

    // A record with a missing price never contributes to any median, so the
    // per-category median over present prices already excludes the record
    // being filled.
    let mut prices_by_category: HashMap<&str, Vec<f64>> = HashMap::new();
    for (record, _, price) in &coerced {
        if let Some(price) = price {
            prices_by_category
                .entry(record.category.as_str())
                .or_default()
                .push(*price);
        }
    }
    let medians: HashMap<String, f64> = prices_by_category
        .into_iter()
        .map(|(category, prices)| (category.to_string(), median(prices)))
        .collect();

    let mut cleaned = Vec::with_capacity(coerced.len());
    let mut dropped = 0usize;
    for (record, quantity, price) in coerced {
        let price = match price.or_else(|| medians.get(&record.category).copied()) {
            Some(price) => price,
            None => {
                dropped += 1;
                continue;
            }
        };
        cleaned.push(CleanRecord {
            transaction_id: record.transaction_id,
            date: record.date,
            category: record.category,
            product: record.product,
            quantity,
            price,
        });
    }
    (cleaned, dropped)
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(category: &str, quantity: Option<&str>, price: Option<&str>) -> RawRecord {
        RawRecord {
            transaction_id: None,
            date: "2024-01-01".to_string(),
            category: category.to_string(),
            product: "widget".to_string(),
            quantity: quantity.map(str::to_string),
            price: price.map(str::to_string),
        }
    }

    #[test]
    fn missing_or_invalid_quantity_becomes_zero() {
        let (cleaned, dropped) = clean_records(vec![
            raw("A", None, Some("5")),
            raw("A", Some("oops"), Some("5")),
            raw("A", Some("3"), Some("5")),
        ]);
        assert_eq!(dropped, 0);
        assert_eq!(cleaned[0].quantity, 0.0);
        assert_eq!(cleaned[1].quantity, 0.0);
        assert_eq!(cleaned[2].quantity, 3.0);
    }

    #[test]
    fn missing_price_filled_with_category_median_of_other_records() {
        let (cleaned, dropped) = clean_records(vec![
            raw("C", None, None),
            raw("C", Some("1"), Some("15")),
        ]);
        assert_eq!(dropped, 0);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].price, 15.0);
        assert_eq!(cleaned[1].price, 15.0);
    }

    #[test]
    fn even_count_median_averages_middle_values() {
        let (cleaned, _) = clean_records(vec![
            raw("A", Some("1"), Some("10")),
            raw("A", Some("1"), Some("20")),
            raw("A", Some("1"), Some("30")),
            raw("A", Some("1"), Some("40")),
            raw("A", Some("1"), None),
        ]);
        assert_eq!(cleaned[4].price, 25.0);
    }

    #[test]
    fn unparseable_price_is_treated_as_missing_then_imputed() {
        let (cleaned, dropped) = clean_records(vec![
            raw("A", Some("2"), Some("free")),
            raw("A", Some("2"), Some("12")),
        ]);
        assert_eq!(dropped, 0);
        assert_eq!(cleaned[0].price, 12.0);
    }

    #[test]
    fn category_with_no_usable_price_is_dropped_entirely() {
        let (cleaned, dropped) = clean_records(vec![
            raw("ghost", Some("4"), None),
            raw("ghost", Some("5"), Some("n/a")),
            raw("real", Some("1"), Some("2")),
        ]);
        assert_eq!(dropped, 2);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].category, "real");
    }

    #[test]
    fn imputation_only_uses_prices_from_the_same_category() {
        let (cleaned, _) = clean_records(vec![
            raw("A", Some("1"), Some("100")),
            raw("B", Some("1"), Some("2")),
            raw("B", Some("1"), None),
        ]);
        assert_eq!(cleaned[2].price, 2.0);
    }
}
