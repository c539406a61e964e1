mod macros;
mod metric;
mod snapshot;

pub use metric::{IntoMetricValue, Metric, MetricSeries, MetricValue, Metrics};
pub use snapshot::{Resource, Snapshot};
