//! Inventory Ledger routes.

use crate::app_state::AppState;
use crate::domain::{InventoryItem, ItemFields};
use crate::error::ServiceError;
use crate::handlers::shared_types::{json_body, ndjson_response};
use crate::services::InventoryLedger;
use crate::wire::{ApiResponse, CountResponse, FindItemsQuery, IncrementRequest, InsertItemResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};

type InventoryState = State<AppState<InventoryLedger>>;

/// GET /items
///
/// Streams every item as NDJSON, one `{"item":{...}}` frame per line.
#[tracing::instrument(skip_all)]
pub async fn list_items(State(state): InventoryState) -> Response {
    // ---
    ndjson_response(state.service().get_all())
}

/// GET /items/search?name={pattern}
///
/// Streams items whose name matches the pattern. A missing pattern, or one
/// the `regex` crate cannot parse, is rejected with `400` before any frame
/// is sent. A pattern that parses but that the store's own regex engine
/// refuses (Postgres rejects `\p{L}`, for one) answers `200` and ends with a
/// `VALIDATION_ERROR` frame. Postgres lookahead such as `a(?=b)` is refused
/// up front, since `regex` does not support it.
#[tracing::instrument(skip(state))]
pub async fn search_items(
    State(state): InventoryState,
    Query(query): Query<FindItemsQuery>,
) -> Result<Response, ServiceError> {
    // ---
    let pattern = query.name.unwrap_or_default();
    let items = state.service().find_by_name_pattern(&pattern)?;

    Ok(ndjson_response(items))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get_item(
    State(state): InventoryState,
    Path(id): Path<String>,
) -> Result<ApiResponse<InventoryItem>, ServiceError> {
    // ---
    let item = state.service().find_by_id(&id).await?;

    Ok(ApiResponse::new(item))
}

/// POST /items
///
/// # Request Body
/// ```json
/// { "name": "autumn waterfall", "quantity": 3 }
/// ```
#[tracing::instrument(skip_all)]
pub async fn insert_item(
    State(state): InventoryState,
    payload: Result<Json<ItemFields>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<InsertItemResponse>), ServiceError> {
    // ---
    let fields = json_body(payload)?;

    let item_id = state.service().insert(fields).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(InsertItemResponse { item_id }),
    ))
}

/// PUT /items/{id}
///
/// Replaces name and quantity. `count` is 0 when no such item exists.
#[tracing::instrument(skip(state, payload))]
pub async fn update_item(
    State(state): InventoryState,
    Path(id): Path<String>,
    payload: Result<Json<ItemFields>, JsonRejection>,
) -> Result<ApiResponse<CountResponse>, ServiceError> {
    // ---
    let fields = json_body(payload)?;

    let count = state.service().update(&id, fields).await?;

    Ok(ApiResponse::new(CountResponse { count }))
}

/// DELETE /items/{id}
///
/// Idempotent: deleting a missing item answers `200` with `count: 0`.
#[tracing::instrument(skip(state))]
pub async fn delete_item(
    State(state): InventoryState,
    Path(id): Path<String>,
) -> Result<ApiResponse<CountResponse>, ServiceError> {
    // ---
    let count = state.service().delete(&id).await?;

    Ok(ApiResponse::new(CountResponse { count }))
}

/// POST /items/{id}/increment
///
/// Applies a signed delta. A delta that would take the quantity below
/// zero answers `409 INSUFFICIENT_STOCK` and changes nothing.
#[tracing::instrument(skip(state, payload))]
pub async fn increment_item(
    State(state): InventoryState,
    Path(id): Path<String>,
    payload: Result<Json<IncrementRequest>, JsonRejection>,
) -> Result<ApiResponse<CountResponse>, ServiceError> {
    // ---
    let req = json_body(payload)?;

    let count = state.service().increment_quantity(&id, req.delta).await?;

    Ok(ApiResponse::new(CountResponse { count }))
}
