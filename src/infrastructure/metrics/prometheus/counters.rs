use metrics::{counter, histogram};
use std::time::Instant;

/// Increment a counter for created users.
pub fn increment_user_created() {
    counter!("users_created_total").increment(1);
}

/// Count authentication attempts by outcome.
pub fn increment_authentication(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("authentications_total", "outcome" => outcome).increment(1);
}

/// Count quantity mutations by direction and outcome.
pub fn increment_quantity_change(delta: i64, applied: bool) {
    let direction = if delta < 0 { "purchase" } else { "stock" };
    let outcome = if applied { "applied" } else { "refused" };
    counter!("quantity_mutations_total", "direction" => direction, "outcome" => outcome)
        .increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
