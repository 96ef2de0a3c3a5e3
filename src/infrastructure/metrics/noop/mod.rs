mod noop_metrics;

pub use noop_metrics::NoopMetrics;
use std::sync::Arc;

/// Creates a metrics implementation that records nothing.
///
/// Selected when `STOREFRONT_METRICS_TYPE` is unset or not `prom`;
/// `/metrics` then renders an empty body.
pub fn create() -> anyhow::Result<crate::domain::MetricsPtr> {
    Ok(Arc::new(NoopMetrics::new()))
}
