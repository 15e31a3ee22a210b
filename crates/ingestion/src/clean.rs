//! Cell-level value cleaning.

use chrono::{NaiveDate, NaiveDateTime};

/// Datetime layouts accepted in addition to the configured date formats.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%b-%Y %H:%M:%S"];

/// Check whether a cell holds one of the missing-value markers.
#[inline]
pub fn is_missing(value: &str, markers: &[String]) -> bool {
    let value = value.trim();
    value.is_empty() || markers.iter().any(|m| m == value)
}

/// Parse a numeric cell, tolerating thousands separators and a percent sign.
pub fn parse_number(raw: &str, markers: &[String]) -> Option<f64> {
    if is_missing(raw, markers) {
        return None;
    }
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '%').collect();
    let cleaned = cleaned.trim();
    if is_missing(cleaned, markers) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a quantity cell, truncating toward zero.
///
/// Negative values and values beyond `u64::MAX` are rejected.
pub fn parse_quantity(raw: &str, markers: &[String]) -> Option<u64> {
    let value = parse_number(raw, markers)?;
    if value < 0.0 || value >= u64::MAX as f64 {
        None
    } else {
        Some(value.trunc() as u64)
    }
}

/// Parse a date cell using the given chrono formats, in order.
///
/// Values with a trailing time component are accepted by their date part.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
