//! Request and response bodies shared by the handlers and the client.

use crate::domain::{InventoryItem, ItemId, UserId};
use crate::error::ErrorBody;
use serde::{Deserialize, Serialize};

// ============================================================================
// Envelope
// ============================================================================

/// Wrapper type for successful API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    // ---
    pub fn new(data: T) -> Self {
        // ---
        Self { data }
    }
}

// ============================================================================
// Credential Authority
// ============================================================================

// No Debug: these carry passwords.
#[derive(Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user_id: UserId,
}

#[derive(Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateTokenResponse {
    pub username: String,
}

// ============================================================================
// Inventory Ledger
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertItemResponse {
    pub item_id: ItemId,
}

/// Number of records a mutation touched (0 or 1).
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IncrementRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct FindItemsQuery {
    pub name: Option<String>,
}

/// One line of an NDJSON item stream. An `error` frame is always last.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFrame {
    Item(InventoryItem),
    Error(ErrorBody),
}
