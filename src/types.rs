/// Normalized column name derived from a header cell.
/// Examples: `station`, `total_cost`, `week_of_mon`
pub type ColumnName = String;
/// Value of one dimension cell inside a group key.
/// Examples: `WABC`, `Primetime`, `National`
pub type DimensionValue = String;
/// Composite grouping key built from dimension values joined by a separator
/// that never appears in spreadsheet data.
/// Example: `WABC\u{0}Primetime`
pub type GroupKey = String;
/// Name of a summed or derived metric on an aggregated group.
/// Examples: `total_cost`, `cost_per_sale`, `roas`
pub type MetricName = String;
/// Normalized calendar-day label.
/// Example: `2025-01-06`
pub type DateLabel = String;
