//! Single-pass grouping and derived-ratio computation.
//!
//! Every dashboard breakdown (by station, by daypart, by creative, by
//! station and daypart) is the same fold: key each record by its dimension
//! values, accumulate metric sums, then derive ratios once per finished
//! group. Ratios are sum-then-divide; accumulating per-record ratios would
//! be mathematically wrong.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::aggregate::GROUP_KEY_SEPARATOR;
use crate::errors::HeatgridError;
use crate::record::{CellValue, Record};
use crate::types::{ColumnName, DimensionValue, GroupKey, MetricName};

/// Declares one summed metric: the output name and the record column it
/// draws from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Metric name on the aggregated group, e.g. `total_cost`.
    pub name: MetricName,
    /// Record column summed into it, e.g. `cost`.
    pub column: ColumnName,
}

impl MetricSpec {
    /// Declare a summed metric.
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
        }
    }
}

/// Declares one derived ratio computed after aggregation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioSpec {
    /// Ratio name on the aggregated group, e.g. `cost_per_sale`.
    pub name: MetricName,
    /// Summed metric supplying the numerator.
    pub numerator: MetricName,
    /// Summed metric supplying the denominator.
    pub denominator: MetricName,
    /// Factor applied after division, e.g. `1000.0` for CPM.
    pub scale: f64,
}

impl RatioSpec {
    /// Declare a plain ratio.
    pub fn new(name: &str, numerator: &str, denominator: &str) -> Self {
        Self::scaled(name, numerator, denominator, 1.0)
    }

    /// Declare a ratio with a post-division scale factor.
    pub fn scaled(name: &str, numerator: &str, denominator: &str, scale: f64) -> Self {
        Self {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            scale,
        }
    }
}

/// Ready-made ratio specs for the standard marketing metric family.
pub mod ratios {
    use super::RatioSpec;

    /// `total_cost / total_sales`.
    pub fn cost_per_sale() -> RatioSpec {
        RatioSpec::new("cost_per_sale", "total_cost", "total_sales")
    }

    /// `total_cost / total_responses`.
    pub fn cost_per_response() -> RatioSpec {
        RatioSpec::new("cost_per_response", "total_cost", "total_responses")
    }

    /// `total_cost / total_actions`.
    pub fn cost_per_action() -> RatioSpec {
        RatioSpec::new("cost_per_action", "total_cost", "total_actions")
    }

    /// `total_revenue / total_spend`.
    pub fn roas() -> RatioSpec {
        RatioSpec::new("roas", "total_revenue", "total_spend")
    }

    /// `total_cost / total_impressions * 1000`.
    pub fn cpm() -> RatioSpec {
        RatioSpec::scaled("cpm", "total_cost", "total_impressions", 1000.0)
    }
}

/// One aggregated output row: a unique combination of dimension values with
/// its metric sums and derived ratios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Dimension values in the order the dimensions were requested.
    pub dimensions: Vec<DimensionValue>,
    /// Composite key of the dimension values.
    pub key: GroupKey,
    /// Running metric sums, keyed by metric name.
    pub sums: IndexMap<MetricName, f64>,
    /// Derived ratios; `None` marks a ratio whose denominator was not
    /// positive, which is "not computable", distinct from a true zero.
    pub ratios: IndexMap<MetricName, Option<f64>>,
    /// Number of records folded into this group.
    pub records: usize,
}

impl Group {
    fn seeded(dimensions: Vec<DimensionValue>, key: GroupKey, metrics: &[MetricSpec]) -> Self {
        Self {
            dimensions,
            key,
            sums: metrics.iter().map(|m| (m.name.clone(), 0.0)).collect(),
            ratios: IndexMap::new(),
            records: 0,
        }
    }

    /// Summed metric value; zero when the metric was not declared.
    pub fn sum(&self, name: &str) -> f64 {
        self.sums.get(name).copied().unwrap_or(0.0)
    }

    /// Derived ratio; `None` when undefined or not declared.
    pub fn ratio(&self, name: &str) -> Option<f64> {
        self.ratios.get(name).copied().flatten()
    }

    /// Sum or ratio by name, for sorting and truncation helpers.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.sums
            .get(name)
            .copied()
            .or_else(|| self.ratios.get(name).copied().flatten())
    }
}

/// Compute the composite group key for one record.
pub fn group_key(record: &Record, dimensions: &[&str]) -> GroupKey {
    dimension_values(record, dimensions).join(GROUP_KEY_SEPARATOR)
}

fn dimension_values(record: &Record, dimensions: &[&str]) -> Vec<DimensionValue> {
    dimensions
        .iter()
        .map(|dim| record.get(*dim).map(CellValue::label).unwrap_or_default())
        .collect()
}

/// Safe division: a non-positive denominator yields `None`, never zero,
/// `NaN`, or a panic.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Group `records` by the ordered `dimensions`, accumulating `metrics` sums
/// and deriving `ratios` once per finished group.
///
/// Single pass over the records; output order is first-observed group order
/// (sorting is a presentation concern). An empty record slice yields an
/// empty vec. Errors only on caller bugs: a dimension absent from the
/// record keys, or a ratio referencing an undeclared metric.
pub fn aggregate(
    records: &[Record],
    dimensions: &[&str],
    metrics: &[MetricSpec],
    ratios: &[RatioSpec],
) -> Result<Vec<Group>, HeatgridError> {
    for ratio in ratios {
        for side in [&ratio.numerator, &ratio.denominator] {
            if !metrics.iter().any(|m| &m.name == side) {
                return Err(HeatgridError::UnknownMetric {
                    metric: side.clone(),
                });
            }
        }
    }
    // Records from one source share a key set, so the first record is
    // enough to catch a mistyped dimension.
    if let Some(first) = records.first() {
        for dim in dimensions {
            if !first.contains_key(*dim) {
                return Err(HeatgridError::UnknownDimension {
                    dimension: (*dim).to_string(),
                });
            }
        }
    }

    let mut groups: IndexMap<GroupKey, Group> = IndexMap::new();
    for record in records {
        let values = dimension_values(record, dimensions);
        let key = values.join(GROUP_KEY_SEPARATOR);
        let group = groups
            .entry(key.clone())
            .or_insert_with(|| Group::seeded(values, key, metrics));
        for metric in metrics {
            let contribution = record.get(&metric.column).map(CellValue::number).unwrap_or(0.0);
            if let Some(sum) = group.sums.get_mut(&metric.name) {
                *sum += contribution;
            }
        }
        group.records += 1;
    }

    let mut out: Vec<Group> = groups.into_values().collect();
    for group in &mut out {
        for ratio in ratios {
            let value = safe_ratio(group.sum(&ratio.numerator), group.sum(&ratio.denominator))
                .map(|v| v * ratio.scale);
            group.ratios.insert(ratio.name.clone(), value);
        }
    }
    debug!(records = records.len(), groups = out.len(), "aggregated breakdown");
    Ok(out)
}

/// One named dimension breakdown requested from a shared record slice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownSpec {
    /// Display name for the breakdown, e.g. `station_daypart`.
    pub name: String,
    /// Ordered dimension columns.
    pub dimensions: Vec<ColumnName>,
}

impl BreakdownSpec {
    /// Declare a breakdown over the given dimension columns.
    pub fn new(name: &str, dimensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Compute several breakdowns from one pre-filtered record slice.
///
/// One grouping pass per breakdown, all sharing the same slice: linear in
/// record count times breakdown count, so re-deriving on every filter
/// change stays cheap.
pub fn breakdowns(
    records: &[Record],
    specs: &[BreakdownSpec],
    metrics: &[MetricSpec],
    ratios: &[RatioSpec],
) -> Result<IndexMap<String, Vec<Group>>, HeatgridError> {
    let mut out = IndexMap::with_capacity(specs.len());
    for spec in specs {
        let dims: Vec<&str> = spec.dimensions.iter().map(String::as_str).collect();
        out.insert(spec.name.clone(), aggregate(records, &dims, metrics, ratios)?);
    }
    Ok(out)
}

/// Keep the `n` highest groups by `metric`, descending, ties broken by
/// group key ascending.
///
/// Truncation happens after full aggregation and a full sort; truncating
/// input rows before aggregating would silently misplace data. Groups whose
/// metric is undefined sort last.
pub fn top_n(
    mut groups: Vec<Group>,
    metric: &str,
    n: usize,
) -> Result<Vec<Group>, HeatgridError> {
    if let Some(first) = groups.first() {
        if !first.sums.contains_key(metric) && !first.ratios.contains_key(metric) {
            return Err(HeatgridError::UnknownMetric {
                metric: metric.to_string(),
            });
        }
    }
    groups.sort_by(|a, b| {
        let ordering = match (a.metric(metric), b.metric(metric)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        ordering.then_with(|| a.key.cmp(&b.key))
    });
    groups.truncate(n);
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn record(station: &str, cost: f64, sales: f64) -> Record {
        let mut r = Record::new();
        r.insert("station".to_string(), CellValue::Text(station.to_string()));
        r.insert("cost".to_string(), CellValue::Number(cost));
        r.insert("sales".to_string(), CellValue::Number(sales));
        r
    }

    fn station_metrics() -> Vec<MetricSpec> {
        vec![
            MetricSpec::new("total_cost", "cost"),
            MetricSpec::new("total_sales", "sales"),
        ]
    }

    #[test]
    fn groups_accumulate_sums_in_first_observed_order() {
        let records = vec![record("B", 200.0, 10.0), record("A", 100.0, 2.0), record("B", 50.0, 5.0)];
        let groups = aggregate(&records, &["station"], &station_metrics(), &[]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dimensions, vec!["B".to_string()]);
        assert_eq!(groups[0].sum("total_cost"), 250.0);
        assert_eq!(groups[0].sum("total_sales"), 15.0);
        assert_eq!(groups[0].records, 2);
        assert_eq!(groups[1].dimensions, vec!["A".to_string()]);
    }

    #[test]
    fn zero_denominator_ratio_is_none_not_zero() {
        let records = vec![record("A", 150.0, 0.0)];
        let groups = aggregate(
            &records,
            &["station"],
            &station_metrics(),
            &[ratios::cost_per_sale()],
        )
        .unwrap();
        assert_eq!(groups[0].ratio("cost_per_sale"), None);
    }

    #[test]
    fn ratios_are_sum_then_divide() {
        let records = vec![record("A", 10.0, 0.0), record("A", 0.0, 5.0)];
        let groups = aggregate(
            &records,
            &["station"],
            &station_metrics(),
            &[ratios::cost_per_sale()],
        )
        .unwrap();
        assert_eq!(groups[0].ratio("cost_per_sale"), Some(2.0));
    }

    #[test]
    fn empty_record_set_yields_empty_groups() {
        let groups = aggregate(&[], &["station"], &station_metrics(), &[]).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn unknown_dimension_fails_loudly() {
        let records = vec![record("A", 1.0, 1.0)];
        let err = aggregate(&records, &["publisher"], &station_metrics(), &[]).unwrap_err();
        assert!(matches!(err, HeatgridError::UnknownDimension { .. }));
    }

    #[test]
    fn ratio_referencing_undeclared_metric_fails_loudly() {
        let records = vec![record("A", 1.0, 1.0)];
        let bad = RatioSpec::new("roas", "total_revenue", "total_spend");
        let err = aggregate(&records, &["station"], &station_metrics(), &[bad]).unwrap_err();
        assert!(matches!(err, HeatgridError::UnknownMetric { .. }));
    }

    #[test]
    fn composite_keys_join_dimensions_with_nul() {
        let mut r = record("WABC", 1.0, 1.0);
        r.insert("daypart".to_string(), CellValue::Text("Prime".to_string()));
        assert_eq!(group_key(&r, &["station", "daypart"]), "WABC\u{0}Prime");
    }

    #[test]
    fn breakdowns_share_one_record_slice() {
        let mut records = Vec::new();
        for (station, daypart, cost) in [("A", "Prime", 10.0), ("A", "Daytime", 20.0), ("B", "Prime", 5.0)] {
            let mut r = record(station, cost, 1.0);
            r.insert("daypart".to_string(), CellValue::Text(daypart.to_string()));
            records.push(r);
        }
        let specs = vec![
            BreakdownSpec::new("by_station", &["station"]),
            BreakdownSpec::new("by_daypart", &["daypart"]),
            BreakdownSpec::new("station_daypart", &["station", "daypart"]),
        ];
        let out = breakdowns(&records, &specs, &station_metrics(), &[]).unwrap();
        assert_eq!(out["by_station"].len(), 2);
        assert_eq!(out["by_daypart"].len(), 2);
        assert_eq!(out["station_daypart"].len(), 3);
        assert_eq!(out["by_station"][0].sum("total_cost"), 30.0);
    }

    #[test]
    fn top_n_sorts_descending_and_breaks_ties_by_key() {
        let records = vec![
            record("C", 10.0, 1.0),
            record("A", 10.0, 1.0),
            record("B", 30.0, 1.0),
            record("D", 5.0, 1.0),
        ];
        let groups = aggregate(&records, &["station"], &station_metrics(), &[]).unwrap();
        let top = top_n(groups, "total_cost", 3).unwrap();
        let order: Vec<&str> = top.iter().map(|g| g.dimensions[0].as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn top_n_rejects_unknown_metric() {
        let records = vec![record("A", 1.0, 1.0)];
        let groups = aggregate(&records, &["station"], &station_metrics(), &[]).unwrap();
        let err = top_n(groups, "total_revenue", 1).unwrap_err();
        assert!(matches!(err, HeatgridError::UnknownMetric { .. }));
    }
}
