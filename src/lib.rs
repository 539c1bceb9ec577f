#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Single-pass grouping and derived-ratio computation.
pub mod aggregate;
/// Calendar label helpers: flexible parsing, broadcast weeks, dayparts.
pub mod calendar;
/// Heatmap shading: gradient interpolation and foreground selection.
pub mod color;
/// Centralized constants used across coercion, grouping, and shading.
pub mod constants;
/// Caller-side record transforms applied before aggregation.
pub mod prepare;
/// Typed cell values, records, and field coercion.
pub mod record;
/// Column declarations and header normalization.
pub mod schema;
/// Delimited-text parsing into a header plus rows.
pub mod table;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregate::{
    aggregate, breakdowns, group_key, safe_ratio, top_n, BreakdownSpec, Group, MetricSpec,
    RatioSpec,
};
pub use color::{
    contrast_ratio, foreground_for, relative_luminance, shade, shade_diverging, CellStyle,
    DivergingPalette, Palette, Rgb, ShadeOptions, WhiteBlend,
};
pub use errors::HeatgridError;
pub use record::{coerce_row, coerce_table, records_from_json, CellValue, Record};
pub use schema::{normalize_header, resolve_column, ColumnSpec, ColumnType, TableSchema};
pub use table::{parse, split_records, RawTable};
pub use types::{ColumnName, DateLabel, DimensionValue, GroupKey, MetricName};
