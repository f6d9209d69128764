//! Month-start date handling.

use chrono::Datelike;
use resmom_primitives::Date;

use crate::{DataError, Result};

/// First day of the date's month.
#[must_use]
pub fn month_start(date: Date) -> Date {
    date.with_day(1).unwrap_or(date)
}

/// Parse a `YYYYMM` month label into the first day of that month.
///
/// Returns `None` for anything that is not exactly six digits naming a
/// valid month.
#[must_use]
pub fn parse_yyyymm(label: &str) -> Option<Date> {
    if label.len() != 6 || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = label[..4].parse().ok()?;
    let month = label[4..].parse().ok()?;
    Date::from_ymd_opt(year, month, 1)
}

/// Ensure `start` is not after `end`.
///
/// # Errors
/// Returns `DataError::InvalidDateRange` otherwise.
pub fn check_range(start: Date, end: Date) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange { start: start.to_string(), end: end.to_string() });
    }
    Ok(())
}
