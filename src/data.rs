use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};

/// Weekday names in calendar order, Monday first. Mode ties during
/// aggregation are broken by position in this list.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// English weekday name for a date, matching the entries in [`WEEKDAYS`].
pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// Position of a weekday name in calendar order, or `None` for an
/// unrecognized name.
pub fn weekday_index(name: &str) -> Option<usize> {
    WEEKDAYS.iter().position(|day| *day == name)
}

/// Lenient numeric coercion for quantity/price cells.
///
/// Missing, empty, non-numeric, non-finite, and negative inputs all coerce
/// to `None`; the cleaning stage decides what "missing" means per field.
pub fn coerce_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() || parsed < 0.0 {
        return None;
    }
    Some(parsed)
}
