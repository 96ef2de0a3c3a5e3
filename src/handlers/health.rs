use crate::app_state::AppState;
use crate::domain::StoreProbe;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(serde::Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

/// Responds with the health status of the server.
///
/// - By default (no query parameters), performs a light check to confirm the web server
///   is running.
///
/// - If `mode=full` is passed as a query parameter, also pings the store through the
///   service, under the configured store timeout.
///
/// # Responses
/// - `200 OK` with `{ "status": "ok" }` if server (and store, in full mode) are healthy.
/// - `503 SERVICE UNAVAILABLE` with `{ "status": "error" }` if the store ping fails.
///
/// # Examples
/// - `GET /health` → 200 OK
/// - `GET /health?mode=full` → 200 OK or 503 SERVICE UNAVAILABLE
pub async fn health_check<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>)
where
    S: StoreProbe + 'static,
{
    match params.mode.as_deref() {
        Some("full") => match state.service().ping().await {
            Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
            Err(err) => {
                tracing::warn!("Store ping failed: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(HealthResponse { status: "error" }),
                )
            }
        },
        _ => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
    }
}
