//! Flexible date parsing for unreliable spreadsheet cells.
//!
//! Source sheets mix ISO strings, Brazilian day-first strings, datetime
//! strings, and raw Excel serial numbers in the same column. Parsing tries
//! each strategy in order and gives up quietly; an unparsable date is a data
//! quality issue, never an error.

use chrono::{Duration, NaiveDate};

/// Excel serial day 0 (the 1900 date system, with its leap-year quirk).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parses a date cell, trying ISO, day-first, and Excel serial forms.
///
/// Returns `None` for empty or unparsable input.
///
/// # Example
///
/// ```
/// use vr_engine::roster::parse_date_flexible;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
/// assert_eq!(parse_date_flexible("2024-01-20"), Some(expected));
/// assert_eq!(parse_date_flexible("20/01/2024"), Some(expected));
/// assert_eq!(parse_date_flexible(""), None);
/// ```
pub fn parse_date_flexible(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    // Datetime cells carry a time suffix; the date prefix is enough.
    let date_part = cell.split_whitespace().next().unwrap_or(cell);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }
    parse_excel_serial(cell)
}

/// Interprets a numeric cell as an Excel serial date.
///
/// Only serials landing in a plausible range (1905-2100) are accepted, so
/// that small integers like a day count are not misread as dates.
fn parse_excel_serial(cell: &str) -> Option<NaiveDate> {
    let serial: f64 = cell.trim().parse().ok()?;
    let days = serial.trunc() as i64;
    if !(2_000..=73_000).contains(&days) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(days))
}

/// Formats a date in the `dd/mm/yyyy` form used by the output sheets.
pub fn format_dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
