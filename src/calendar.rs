//! Calendar bucket mappings used by the seasonality groupings.
//!
//! Out-of-range codes are rejected rather than papered over: a bad weekday or
//! month number means the upstream data is broken.

use chrono::{Datelike, NaiveDate};

use crate::errors::AnalyticsError;

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Day-of-week name for a 0-based code, Sunday=0 .. Saturday=6.
pub fn weekday_name(code: u32) -> Result<&'static str, AnalyticsError> {
    WEEKDAY_NAMES
        .get(code as usize)
        .copied()
        .ok_or_else(|| AnalyticsError::DomainMapping(format!("weekday code {} out of range 0-6", code)))
}

/// Month name for a 1-based month number.
pub fn month_name(month: u32) -> Result<&'static str, AnalyticsError> {
    if !(1..=12).contains(&month) {
        return Err(AnalyticsError::DomainMapping(format!(
            "month number {} out of range 1-12",
            month
        )));
    }
    Ok(MONTH_NAMES[(month - 1) as usize])
}

/// Quarter label for a 1-based month number: {1,2,3}=Q1 .. {10,11,12}=Q4.
pub fn quarter_label(month: u32) -> Result<&'static str, AnalyticsError> {
    match month {
        1..=3 => Ok("Q1"),
        4..=6 => Ok("Q2"),
        7..=9 => Ok("Q3"),
        10..=12 => Ok("Q4"),
        other => Err(AnalyticsError::DomainMapping(format!(
            "month number {} out of range 1-12",
            other
        ))),
    }
}

/// "YYYY-MM" period key, the sort key for all monthly sequences.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// 0-based weekday code for a date, Sunday=0.
pub fn weekday_code(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}
