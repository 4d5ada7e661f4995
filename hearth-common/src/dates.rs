//! Date and age helpers
//!
//! Calendar dates travel as `YYYY-MM-DD`; event times as `HH:MM`.
//! "Today" is the platform's local date, with no further timezone conversion.

use crate::{Error, Result};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};

/// Current local calendar date
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// The calendar day after `today`
pub fn tomorrow_of(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}

/// Whole years between `date_of_birth` and `today`
///
/// The birthday itself counts: someone born on 2000-06-15 is 25 on 2025-06-15.
pub fn calculate_age(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Long display form, e.g. "March 5, 2025"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Parse a calendar date
///
/// Accepts `YYYY-MM-DD` and also a full RFC 3339 timestamp, keeping only its date part.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", input)))
}

/// Parse a wall-clock time and normalize it to `HH:MM`
pub fn parse_time(input: &str) -> Result<String> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| Error::InvalidInput(format!("Invalid time '{}', expected HH:MM", input)))
}

/// Validate a date of birth: it must lie strictly before `today`
pub fn validate_date_of_birth(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let date = parse_date(input)?;
    if date >= today {
        return Err(Error::InvalidInput(
            "Date of birth must be in the past".to_string(),
        ));
    }
    Ok(date)
}
