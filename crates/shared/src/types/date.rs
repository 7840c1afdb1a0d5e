//! Store date codec and calendar arithmetic.
//!
//! The document store persists date fields as `dd/MM/yyyy` strings (not
//! native timestamps) except `createdAt`/`updatedAt`. The codec here must
//! round-trip that representation bit-exactly for interop with existing
//! records.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::{AppError, AppResult};

/// Wire format for persisted date fields.
pub const STORE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Formats a date in the store's `dd/MM/yyyy` wire format.
#[must_use]
pub fn format_store_date(date: NaiveDate) -> String {
    date.format(STORE_DATE_FORMAT).to_string()
}

/// Parses a date from the store's `dd/MM/yyyy` wire format.
pub fn parse_store_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, STORE_DATE_FORMAT)
        .map_err(|e| AppError::Validation(format!("invalid store date '{raw}': {e}")))
}

/// Returns the day before `today`.
#[must_use]
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today - Days::new(1)
}

/// Adds `months` calendar months, clamping to the last day of the target
/// month when the source day does not exist there (e.g. 31 Jan + 1 month
/// = 28/29 Feb).
#[must_use]
pub fn months_after(date: NaiveDate, months: u32) -> NaiveDate {
    date + Months::new(months)
}

/// Returns true when two dates fall in different calendar years.
#[must_use]
pub fn spans_years(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() != b.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_store_date_round_trip() {
        let date = d(2026, 3, 7);
        let raw = format_store_date(date);
        assert_eq!(raw, "07/03/2026");
        assert_eq!(parse_store_date(&raw).unwrap(), date);
    }

    #[test]
    fn test_store_date_rejects_iso_form() {
        assert!(parse_store_date("2026-03-07").is_err());
        assert!(parse_store_date("").is_err());
    }

    #[test]
    fn test_yesterday_crosses_month_boundary() {
        assert_eq!(yesterday(d(2026, 3, 1)), d(2026, 2, 28));
    }

    #[test]
    fn test_months_after_clamps_to_month_end() {
        assert_eq!(months_after(d(2026, 1, 31), 1), d(2026, 2, 28));
        assert_eq!(months_after(d(2026, 5, 15), 1), d(2026, 6, 15));
    }

    #[test]
    fn test_spans_years() {
        assert!(spans_years(d(2025, 12, 31), d(2026, 1, 1)));
        assert!(!spans_years(d(2026, 1, 1), d(2026, 12, 31)));
    }
}
