//! Typed cell values, records, and field coercion.
//!
//! Coercion is the trust boundary: raw cells come from spreadsheet exports
//! or a remote API and may hold anything. Every coercion degrades locally
//! (zero, empty string, declared fallback) so a single bad cell can never
//! poison a downstream sum with `NaN` or abort a dashboard render.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::calendar;
use crate::constants::coerce::NULL_SENTINELS;
use crate::schema::{normalize_header, squash_key, ColumnType, TableSchema};
use crate::table::RawTable;
use crate::types::{ColumnName, DateLabel};

/// One coerced row: normalized column names mapped to typed cells, in
/// header order. Every record from the same source carries the same keys.
pub type Record = IndexMap<ColumnName, CellValue>;

/// A typed cell inside a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Trimmed free text; empty means the cell was blank or a null sentinel.
    Text(String),
    /// Finite number; uncoercible numeric cells become `0.0`.
    Number(f64),
    /// Normalized `YYYY-MM-DD` label; empty means the cell was unparseable.
    Date(DateLabel),
}

impl CellValue {
    /// Numeric view used by metric sums. Non-numeric cells contribute zero.
    pub fn number(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    /// Display label used for dimension values and re-export.
    pub fn label(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Date(label) => label.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    /// Whether the cell holds no usable content.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Date(label) => label.is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

/// Strip currency punctuation (`$`, `,`) and parse as a number.
/// Uncoercible input yields `0.0`.
pub fn coerce_currency(raw: &str) -> f64 {
    let stripped: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    coerce_number(&stripped)
}

/// Parse a plain number, guarding against `NaN` and infinities.
/// Uncoercible input yields `0.0`.
pub fn coerce_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Trim a text cell, mapping null sentinels to empty and empty to the
/// declared fallback when one is given.
pub fn coerce_text(raw: &str, fallback: Option<&str>) -> String {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();
    let effective = if trimmed.is_empty() || NULL_SENTINELS.contains(&upper.as_str()) {
        ""
    } else {
        trimmed
    };
    if effective.is_empty() {
        fallback.unwrap_or("").to_string()
    } else {
        effective.to_string()
    }
}

/// Coerce one raw row against the header and schema.
///
/// Returns `None` when the key column is empty: those rows are repeated
/// headers, section breaks, or trailing blanks from the export, not data.
pub fn coerce_row(header: &[String], raw_row: &[String], schema: &TableSchema) -> Option<Record> {
    let mut record = Record::new();
    for (idx, raw_name) in header.iter().enumerate() {
        let column = normalize_header(raw_name);
        if column.is_empty() {
            continue;
        }
        let raw = raw_row.get(idx).map(String::as_str).unwrap_or("");
        let spec = schema.spec_for(&column);
        let value = match spec.map(|s| s.column_type).unwrap_or(ColumnType::Text) {
            ColumnType::Currency => CellValue::Number(coerce_currency(raw)),
            ColumnType::Number => CellValue::Number(coerce_number(raw)),
            ColumnType::Date => CellValue::Date(calendar::coerce_date_label(raw)),
            ColumnType::Text => {
                CellValue::Text(coerce_text(raw, spec.and_then(|s| s.fallback.as_deref())))
            }
        };
        record.insert(column, value);
    }
    if record.is_empty() {
        return None;
    }
    let key_column = key_column_name(&record, schema)?;
    match record.get(&key_column) {
        Some(value) if !value.is_empty() => Some(record),
        _ => {
            debug!(key = %key_column, "dropping row with empty key cell");
            None
        }
    }
}

/// Coerce an entire parsed table into records.
pub fn coerce_table(table: &RawTable, schema: &TableSchema) -> Vec<Record> {
    let records: Vec<Record> = table
        .rows
        .iter()
        .filter_map(|row| coerce_row(&table.header, row, schema))
        .collect();
    let dropped = table.rows.len() - records.len();
    if dropped > 0 {
        debug!(kept = records.len(), dropped, "coerced table rows");
    }
    records
}

/// Coerce JSON rows (objects from a REST aggregation API) into records.
///
/// Object keys are matched to declared columns by squashed alias comparison,
/// so `totalCost`, `Total Cost`, and `total_cost` all bind the same column.
/// Non-object rows are skipped.
pub fn records_from_json(rows: &[Value], schema: &TableSchema) -> Vec<Record> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(object) = row.as_object() else {
            debug!("skipping non-object JSON row");
            continue;
        };
        let mut record = Record::new();
        for spec in &schema.columns {
            let target = squash_key(&spec.column);
            let raw = object
                .iter()
                .find(|(key, _)| squash_key(key) == target)
                .map(|(_, value)| value);
            record.insert(spec.column.clone(), coerce_json_cell(raw, spec.column_type, spec.fallback.as_deref()));
        }
        if record.is_empty() {
            continue;
        }
        let Some(key_column) = key_column_name(&record, schema) else {
            continue;
        };
        match record.get(&key_column) {
            Some(value) if !value.is_empty() => records.push(record),
            _ => debug!(key = %key_column, "dropping JSON row with empty key cell"),
        }
    }
    records
}

/// Coerce one JSON value per the declared column type.
fn coerce_json_cell(raw: Option<&Value>, column_type: ColumnType, fallback: Option<&str>) -> CellValue {
    match column_type {
        ColumnType::Currency | ColumnType::Number => {
            let number = match raw {
                Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
                Some(Value::String(s)) => coerce_currency(s),
                _ => 0.0,
            };
            CellValue::Number(number)
        }
        ColumnType::Date => {
            let label = match raw {
                Some(Value::String(s)) => calendar::coerce_date_label(s),
                _ => String::new(),
            };
            CellValue::Date(label)
        }
        ColumnType::Text => {
            let text = match raw {
                Some(Value::String(s)) => coerce_text(s, fallback),
                Some(Value::Number(n)) => n.to_string(),
                _ => coerce_text("", fallback),
            };
            CellValue::Text(text)
        }
    }
}

/// Resolve the key column: the declared one, or the first record key.
fn key_column_name(record: &Record, schema: &TableSchema) -> Option<ColumnName> {
    match &schema.key_column {
        Some(name) => Some(normalize_header(name)),
        None => record.keys().next().cloned(),
    }
}
