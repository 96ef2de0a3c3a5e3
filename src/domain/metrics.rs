use std::sync::Arc;
use std::time::Instant;

/// Abstraction for application metrics (counters, histograms).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a "user created" event.
    fn record_user_created(&self);

    /// Record an authentication attempt and whether it succeeded.
    fn record_authentication(&self, success: bool);

    /// Record a quantity mutation; `applied` is false when it was refused.
    fn record_quantity_change(&self, delta: i64, applied: bool);

    /// Record HTTP request duration and labels.
    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
