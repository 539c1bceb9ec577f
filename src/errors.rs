use thiserror::Error;

use crate::types::{ColumnName, MetricName};

/// Error type for caller-side precondition violations.
///
/// Data-quality problems (malformed CSV, uncoercible cells, zero
/// denominators, empty filter results) are never errors; they degrade to
/// zero-values, `None` ratios, or empty outputs. The variants here only
/// surface bugs in how the caller wired the pipeline together.
#[derive(Debug, Error)]
pub enum HeatgridError {
    #[error("dimension '{dimension}' is not present in the record keys")]
    UnknownDimension { dimension: ColumnName },
    #[error("metric '{metric}' is not declared for this breakdown")]
    UnknownMetric { metric: MetricName },
    #[error("configuration error: {0}")]
    Configuration(String),
}
