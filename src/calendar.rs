//! Calendar label helpers for date dimensions.
//!
//! Spreadsheet exports mix `M/D/YYYY` and ISO dates in the same column;
//! everything here normalizes onto `YYYY-MM-DD` labels so by-date groups
//! sort lexicographically and weekly rollups share one anchor convention.

use chrono::{Datelike, Days, NaiveDate};

use crate::types::DateLabel;

/// Parse a date cell in `M/D/YYYY`, `MM/DD/YYYY`, or `YYYY-MM-DD` form.
///
/// Returns `None` when parsing fails.
pub fn parse_flexible(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    None
}

/// Format a date as a `YYYY-MM-DD` label.
pub fn date_label(date: NaiveDate) -> DateLabel {
    date.format("%Y-%m-%d").to_string()
}

/// Coerce a raw date cell to a normalized label, or empty when unparseable.
///
/// Empty is deliberate: an `Invalid Date` sentinel would become its own
/// group and pollute every trend chart downstream. Callers grouping by date
/// drop empty labels before output.
pub fn coerce_date_label(raw: &str) -> DateLabel {
    parse_flexible(raw).map(date_label).unwrap_or_default()
}

/// Label for the broadcast week containing `date`: the `YYYY-MM-DD` of its
/// Monday.
pub fn week_label(date: NaiveDate) -> DateLabel {
    let back = u64::from(date.weekday().num_days_from_monday());
    date_label(date.checked_sub_days(Days::new(back)).unwrap_or(date))
}

/// English weekday name for day-of-week breakdowns.
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// Map an hour of day (0-23) to its daypart label.
pub fn hour_to_daypart(hour: u32) -> &'static str {
    match hour {
        0 | 1 => "Late Fringe",
        2..=5 => "Overnight",
        6..=8 => "Early Morning",
        9..=17 => "Daytime",
        18..=23 => "Prime",
        _ => "Unknown",
    }
}
