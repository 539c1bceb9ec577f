//! Caller-side record transforms applied before aggregation.
//!
//! The aggregator itself never filters or rewrites records; everything here
//! runs on the caller's slice first. That keeps the grouping pass a pure
//! fold and keeps policy decisions (attribution scaling, date hygiene,
//! categorical cleanup) at the boundary where filters already live.

use tracing::{debug, warn};

use crate::constants::coerce::{NULL_SENTINELS, UNKNOWN_STATION};
use crate::record::{CellValue, Record};
use crate::schema::normalize_header;

/// Scale the named numeric columns by a user-entered attribution
/// multiplier, in place.
///
/// Applied before aggregation so every downstream sum and ratio reflects
/// it. Non-finite or negative multipliers are ignored.
pub fn apply_attribution(records: &mut [Record], columns: &[&str], multiplier: f64) {
    if !multiplier.is_finite() || multiplier < 0.0 {
        warn!(multiplier, "ignoring invalid attribution multiplier");
        return;
    }
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
    for record in records.iter_mut() {
        for column in &normalized {
            if let Some(CellValue::Number(value)) = record.get_mut(column) {
                *value *= multiplier;
            }
        }
    }
}

/// Drop records whose date cell is empty before a by-date breakdown.
///
/// Unparseable dates coerce to empty labels; letting them through would
/// create one poison group that pollutes every trend chart.
pub fn drop_invalid_dates(records: Vec<Record>, date_column: &str) -> Vec<Record> {
    let column = normalize_header(date_column);
    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| record.get(&column).map(|v| !v.is_empty()).unwrap_or(false))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        debug!(column = %column, dropped, "dropped records with invalid dates");
    }
    kept
}

/// Keep records whose date label falls inside `[start, end]` inclusive.
///
/// Labels are normalized `YYYY-MM-DD`, so the comparison is lexicographic.
/// Records with empty date labels are excluded.
pub fn filter_date_range(records: &[Record], date_column: &str, start: &str, end: &str) -> Vec<Record> {
    let column = normalize_header(date_column);
    records
        .iter()
        .filter(|record| {
            record
                .get(&column)
                .map(|value| {
                    let label = value.label();
                    !label.is_empty() && label.as_str() >= start && label.as_str() <= end
                })
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Normalize a station name: trim, uppercase, null sentinels to `UNKNOWN`.
pub fn normalize_station(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() || NULL_SENTINELS.contains(&upper.as_str()) {
        UNKNOWN_STATION.to_string()
    } else {
        upper
    }
}

/// Collapse national-market naming variants onto `National`; other markets
/// pass through trimmed with inner whitespace collapsed.
pub fn normalize_market(raw: &str) -> String {
    let collapsed = raw.trim().split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.to_lowercase().as_str() {
        "national" | "national cable" | "national network" => "National".to_string(),
        _ => collapsed,
    }
}
