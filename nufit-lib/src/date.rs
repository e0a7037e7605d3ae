//src/date.rs
use chrono::{Days, Local, NaiveDate};
use thiserror::Error;

/// Canonical day key format (`YYYY-MM-DD`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidKey(String),
    #[error("Date {0} shifted by {1} days is out of range")]
    OutOfRange(NaiveDate, i64),
}

/// Current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local calendar day as a date key.
pub fn today_key() -> String {
    date_key(today())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` key into a calendar date.
/// # Errors
/// Returns `DateError::InvalidKey` if the key is not a valid calendar day.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT)
        .map_err(|_| DateError::InvalidKey(key.to_string()))
}

/// Shifts a date by `n` days (negative `n` goes back). Month and year
/// boundaries roll over through chrono's calendar arithmetic.
pub fn shift(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(n.unsigned_abs());
    if n >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

/// Returns the key `n` days after `key`.
/// # Errors
/// - `DateError::InvalidKey` if `key` does not parse.
/// - `DateError::OutOfRange` if the result falls outside chrono's supported range.
pub fn add_days(key: &str, n: i64) -> Result<String, DateError> {
    let date = parse_date_key(key)?;
    shift(date, n)
        .map(date_key)
        .ok_or(DateError::OutOfRange(date, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_days_rolls_over_month_and_year() {
        assert_eq!(add_days("2024-12-30", 3).unwrap(), "2025-01-02");
        assert_eq!(add_days("2024-02-28", 1).unwrap(), "2024-02-29");
        assert_eq!(add_days("2023-02-28", 1).unwrap(), "2023-03-01");
        assert_eq!(add_days("2025-03-01", -1).unwrap(), "2025-02-28");
        assert_eq!(add_days("2025-01-01", 0).unwrap(), "2025-01-01");
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(
            parse_date_key("2025-13-01"),
            Err(DateError::InvalidKey("2025-13-01".to_string()))
        );
        assert!(add_days("yesterday", 1).is_err());
    }

    #[test]
    fn date_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        assert_eq!(date_key(date), "2025-01-07");
        assert_eq!(parse_date_key("2025-01-07").unwrap(), date);
    }

    #[test]
    fn today_key_matches_today() {
        assert_eq!(parse_date_key(&today_key()).unwrap(), today());
    }
}
