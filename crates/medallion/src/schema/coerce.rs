//! Cell-level type coercion toward canonical column types.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{ColumnType, Value};

// Patterns compiled once on first use.

/// Thousands-grouped numbers such as `1,234,567.89`.
static GROUPED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// Year-month with no day, e.g. `2024-03` or `2024/3`.
static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").unwrap());

/// Compact dates such as `20240315`.
static COMPACT_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());

/// Chinese calendar notation, e.g. `2024年3月15日` or `2024年3月`.
static CJK_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})年(\d{1,2})月(?:(\d{1,2})日)?$").unwrap());

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Serial day numbers below this (1927-05-18) are more likely years or
/// counts than dates.
const MIN_SERIAL_DAY: f64 = 10_000.0;

/// Largest spreadsheet serial day number (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

const CURRENCY_SYMBOLS: &[char] = &['¥', '￥', '$', '€', '£'];

/// Coerce a cell to the given column type.
///
/// Returns `None` when a non-null value cannot be represented in the target
/// type. Nulls always coerce to [`Value::Null`].
pub fn coerce(value: &Value, target: ColumnType) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }

    match target {
        ColumnType::Numeric => coerce_number(value).map(Value::Number),
        ColumnType::Date => coerce_date(value).map(Value::Date),
        ColumnType::Categorical | ColumnType::String => Some(coerce_text(value)),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_number(s),
        Value::Date(_) | Value::Null => None,
    }
}

fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Number(n) => from_serial_day(*n),
        Value::Text(s) => parse_date(s),
        Value::Null => None,
    }
}

fn coerce_text(value: &Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(s.trim().to_string()),
        // Whole-number codes read as numbers keep their integer form.
        Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
            Value::Text(format!("{}", *n as i64))
        }
        other => Value::Text(other.to_string()),
    }
}

/// Parse a number, tolerating a leading currency symbol, thousands grouping
/// and surrounding whitespace.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(CURRENCY_SYMBOLS)
        .unwrap_or(trimmed)
        .trim_start();

    let candidate = if GROUPED_NUMBER.is_match(trimmed) {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    };

    candidate.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a calendar date from the textual forms found in market workbooks.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    if let Some(caps) = COMPACT_DATE.captures(trimmed) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = YEAR_MONTH.captures(trimmed) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    if let Some(caps) = CJK_DATE.captures(trimmed) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps.get(3).map_or(Some(1), |d| d.as_str().parse().ok())?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Spreadsheet serial day numbers exported as text.
    trimmed.parse::<f64>().ok().and_then(from_serial_day)
}

/// Convert a spreadsheet serial day number (days since 1899-12-30) to a date.
pub fn from_serial_day(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(MIN_SERIAL_DAY..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("1234.5"), Some(1234.5));
        assert_eq!(parse_number(" 1,234,567 "), Some(1_234_567.0));
        assert_eq!(parse_number("¥1,200.50"), Some(1200.5));
        assert_eq!(parse_number("-42"), Some(-42.0));
        assert_eq!(parse_number("1,2"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date("2024-03-15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024/03/15"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("20240315"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024-03"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("2024年3月15日"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("2024年3月"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("2024-03-15 08:30:00"), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("2024-13"), None);
    }

    #[test]
    fn test_serial_day() {
        assert_eq!(from_serial_day(45000.0), Some(ymd(2023, 3, 15)));
        assert_eq!(parse_date("45000"), Some(ymd(2023, 3, 15)));
        assert_eq!(from_serial_day(0.0), None);
        assert_eq!(parse_date("2024"), None);
        assert_eq!(from_serial_day(f64::NAN), None);
    }

    #[test]
    fn test_coerce_by_target() {
        assert_eq!(
            coerce(&Value::text("1,000"), ColumnType::Numeric),
            Some(Value::Number(1000.0))
        );
        assert_eq!(coerce(&Value::text("lots"), ColumnType::Numeric), None);
        assert_eq!(
            coerce(&Value::Number(45000.0), ColumnType::Date),
            Some(Value::Date(ymd(2023, 3, 15)))
        );
        assert_eq!(
            coerce(&Value::Number(1001.0), ColumnType::Categorical),
            Some(Value::text("1001"))
        );
        assert_eq!(
            coerce(&Value::text("  RX "), ColumnType::Categorical),
            Some(Value::text("RX"))
        );
        assert_eq!(coerce(&Value::Null, ColumnType::Date), Some(Value::Null));
    }
}
