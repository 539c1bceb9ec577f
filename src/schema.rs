//! Column declarations and header normalization.
//!
//! A `TableSchema` is the declared contract between one data source and the
//! aggregation layer: which columns exist, how each cell coerces, and which
//! column marks a row as real data. Declaring the map up front means a
//! renamed spreadsheet column fails visibly at the coercion boundary instead
//! of producing missing values deep inside a chart.

use serde::{Deserialize, Serialize};

use crate::types::ColumnName;

/// Declared cell type for one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Dollar-formatted number; `$` and `,` are stripped before parsing.
    Currency,
    /// Plain floating-point number.
    Number,
    /// Calendar date accepted as `M/D/YYYY`, `MM/DD/YYYY`, or `YYYY-MM-DD`.
    Date,
    /// Free text, trimmed.
    Text,
}

/// Declaration for one column of a data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Normalized column name this spec applies to.
    pub column: ColumnName,
    /// How raw cells in this column coerce.
    pub column_type: ColumnType,
    /// Label substituted for empty text cells, when the caller wants one.
    pub fallback: Option<String>,
}

impl ColumnSpec {
    /// Declare a column; the name is normalized like a header cell.
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            column: normalize_header(name),
            column_type,
            fallback: None,
        }
    }

    /// Declare a text column whose empty cells become `fallback`.
    pub fn with_fallback(name: &str, column_type: ColumnType, fallback: &str) -> Self {
        Self {
            column: normalize_header(name),
            column_type,
            fallback: Some(fallback.to_string()),
        }
    }
}

/// Declared column map for one data source.
///
/// Columns present in the data but absent here coerce as plain text;
/// columns declared here but absent from the data simply do not appear in
/// the records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column declarations, in display order.
    pub columns: Vec<ColumnSpec>,
    /// Column whose empty cells mark a row as a spreadsheet artifact
    /// (repeated header, section break, trailing blank). Defaults to the
    /// first column when unset.
    pub key_column: Option<ColumnName>,
}

impl TableSchema {
    /// Look up the declaration for a normalized column name.
    pub fn spec_for(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.column == column)
    }
}

/// Normalize a header cell into a column name: lowercase, parentheses
/// stripped, internal whitespace collapsed to `_`.
///
/// Example: `Week Of (Mon)` becomes `week_of_mon`.
pub fn normalize_header(raw: &str) -> ColumnName {
    let lowered = raw.to_lowercase();
    let without_parens: String = lowered.chars().filter(|c| *c != '(' && *c != ')').collect();
    without_parens.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Squash a column name to lowercase alphanumerics for alias matching.
///
/// Example: `T Adspots Market` and `t_adspots_market` both squash to
/// `tadspotsmarket`.
pub fn squash_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Resolve the first header column matching any alias candidate, in
/// candidate priority order. Returns the header index.
///
/// Sources disagree on naming (`station` vs `network` vs `channel`); callers
/// list the aliases they accept and bind the schema to whichever is present.
pub fn resolve_column(header: &[String], candidates: &[&str]) -> Option<usize> {
    let squashed: Vec<String> = header.iter().map(|cell| squash_key(cell)).collect();
    for candidate in candidates {
        let target = squash_key(candidate);
        if let Some(idx) = squashed.iter().position(|cell| *cell == target) {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers_with_parens_and_spacing() {
        assert_eq!(normalize_header("Week Of (Mon)"), "week_of_mon");
        assert_eq!(normalize_header("  Total   Cost "), "total_cost");
        assert_eq!(normalize_header("Station"), "station");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn squash_key_ignores_case_and_punctuation() {
        assert_eq!(squash_key("T Adspots Market"), "tadspotsmarket");
        assert_eq!(squash_key("t_adspots_market"), "tadspotsmarket");
        assert_eq!(squash_key("Session-ID"), "sessionid");
    }

    #[test]
    fn resolves_first_present_alias_in_priority_order() {
        let header = vec![
            "Spot Date".to_string(),
            "Network".to_string(),
            "Channel".to_string(),
        ];
        assert_eq!(resolve_column(&header, &["station", "network", "channel"]), Some(1));
        assert_eq!(resolve_column(&header, &["channel"]), Some(2));
        assert_eq!(resolve_column(&header, &["publisher"]), None);
    }

    #[test]
    fn spec_lookup_uses_normalized_names() {
        let schema = TableSchema {
            columns: vec![ColumnSpec::new("Total Cost ($)", ColumnType::Currency)],
            key_column: None,
        };
        assert!(schema.spec_for("total_cost_$").is_some());
        assert!(schema.spec_for("total_cost").is_none());
    }

    #[test]
    fn fallback_declaration_is_carried() {
        let spec = ColumnSpec::with_fallback("Creative", ColumnType::Text, "Unknown");
        assert_eq!(spec.column, "creative");
        assert_eq!(spec.fallback.as_deref(), Some("Unknown"));
    }
}
