//! HTTP clients for the two services.
//!
//! Every non-2xx answer is decoded into [`ClientError::Service`] carrying the
//! stable [`ErrorCode`], so callers branch on codes rather than on statuses.
//! NDJSON streams are collected; a terminal error frame becomes
//! [`ClientError::StreamAborted`], which still carries every item delivered
//! before it.

use crate::domain::{InventoryItem, ItemFields, ItemId, UserId};
use crate::error::{ErrorBody, ErrorCode};
use crate::wire::{
    ApiResponse, AuthenticateRequest, AuthenticateResponse, CountResponse, CreateUserRequest,
    CreateUserResponse, IncrementRequest, InsertItemResponse, StreamFrame, ValidateTokenRequest,
    ValidateTokenResponse,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered {status} {}: {message}", code.as_str())]
    Service {
        status: u16,
        code: ErrorCode,
        message: String,
    },

    #[error("stream aborted after {} item(s) with {}: {message}", delivered.len(), code.as_str())]
    StreamAborted {
        delivered: Vec<InventoryItem>,
        code: ErrorCode,
        message: String,
    },

    #[error("undecodable response: {0}")]
    Decode(String),
}

impl ClientError {
    // ---
    /// The service's error code, if the failure came from the service.
    pub fn code(&self) -> Option<ErrorCode> {
        // ---
        match self {
            ClientError::Service { code, .. } | ClientError::StreamAborted { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }

    /// Items received before a stream was cut short; empty otherwise.
    pub fn delivered(&self) -> &[InventoryItem] {
        // ---
        match self {
            ClientError::StreamAborted { delivered, .. } => delivered,
            _ => &[],
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    // ---
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(ClientError::Service {
            status: status.as_u16(),
            code: body.code,
            message: body.message,
        }),
        Err(_) => Err(ClientError::Decode(format!("{status}: {text}"))),
    }
}

async fn send_for_data<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    // ---
    let text = send(request).await?.text().await?;
    serde_json::from_str::<ApiResponse<T>>(&text)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

async fn send_for_items(request: RequestBuilder) -> Result<Vec<InventoryItem>, ClientError> {
    // ---
    let text = send(request).await?.text().await?;
    parse_ndjson(&text)
}

fn parse_ndjson(text: &str) -> Result<Vec<InventoryItem>, ClientError> {
    // ---
    let mut items = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let frame: StreamFrame =
            serde_json::from_str(line).map_err(|e| ClientError::Decode(e.to_string()))?;
        match frame {
            StreamFrame::Item(item) => items.push(item),
            StreamFrame::Error(body) => {
                return Err(ClientError::StreamAborted {
                    delivered: items,
                    code: body.code,
                    message: body.message,
                })
            }
        }
    }
    Ok(items)
}

// ============================================================================
// Credential Authority
// ============================================================================

#[derive(Clone)]
pub struct CredentialClient {
    // ---
    base_url: String,
    http: Client,
}

impl CredentialClient {
    // ---
    pub fn new(base_url: impl Into<String>) -> Self {
        // ---
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        // ---
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        // ---
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<UserId, ClientError> {
        // ---
        let body = CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: CreateUserResponse =
            send_for_data(self.http.post(self.url("/users")).json(&body)).await?;
        Ok(response.user_id)
    }

    /// Returns a bearer token on success.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ClientError> {
        // ---
        let body = AuthenticateRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: AuthenticateResponse =
            send_for_data(self.http.post(self.url("/authenticate")).json(&body)).await?;
        Ok(response.token)
    }

    /// Returns the username the token was issued to.
    pub async fn validate_token(&self, token: &str) -> Result<String, ClientError> {
        // ---
        let body = ValidateTokenRequest {
            token: token.to_string(),
        };
        let response: ValidateTokenResponse =
            send_for_data(self.http.post(self.url("/tokens/validate")).json(&body)).await?;
        Ok(response.username)
    }
}

// ============================================================================
// Inventory Ledger
// ============================================================================

#[derive(Clone)]
pub struct InventoryClient {
    // ---
    base_url: String,
    http: Client,
}

impl InventoryClient {
    // ---
    pub fn new(base_url: impl Into<String>) -> Self {
        // ---
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        // ---
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        // ---
        format!("{}{}", self.base_url, path)
    }

    /// Collects every item. If the server cuts the stream short, the
    /// returned [`ClientError::StreamAborted`] holds what arrived first.
    pub async fn get_all(&self) -> Result<Vec<InventoryItem>, ClientError> {
        // ---
        send_for_items(self.http.get(self.url("/items"))).await
    }

    pub async fn find_by_name_pattern(&self, pattern: &str) -> Result<Vec<InventoryItem>, ClientError> {
        // ---
        let request = self
            .http
            .get(self.url("/items/search"))
            .query(&[("name", pattern)]);
        send_for_items(request).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<InventoryItem, ClientError> {
        // ---
        send_for_data(self.http.get(self.url(&format!("/items/{id}")))).await
    }

    pub async fn insert(&self, name: &str, quantity: i64) -> Result<ItemId, ClientError> {
        // ---
        let fields = ItemFields {
            name: name.to_string(),
            quantity,
        };
        let response: InsertItemResponse =
            send_for_data(self.http.post(self.url("/items")).json(&fields)).await?;
        Ok(response.item_id)
    }

    pub async fn update(&self, id: &str, name: &str, quantity: i64) -> Result<u64, ClientError> {
        // ---
        let fields = ItemFields {
            name: name.to_string(),
            quantity,
        };
        let response: CountResponse =
            send_for_data(self.http.put(self.url(&format!("/items/{id}"))).json(&fields)).await?;
        Ok(response.count)
    }

    pub async fn delete(&self, id: &str) -> Result<u64, ClientError> {
        // ---
        let response: CountResponse =
            send_for_data(self.http.delete(self.url(&format!("/items/{id}")))).await?;
        Ok(response.count)
    }

    pub async fn increment_quantity(&self, id: &str, delta: i64) -> Result<u64, ClientError> {
        // ---
        let request = self
            .http
            .post(self.url(&format!("/items/{id}/increment")))
            .json(&IncrementRequest { delta });
        let response: CountResponse = send_for_data(request).await?;
        Ok(response.count)
    }

    /// Adds `units` to the stored quantity.
    pub async fn stock_item(&self, id: &str, units: u32) -> Result<u64, ClientError> {
        // ---
        self.increment_quantity(id, i64::from(units)).await
    }

    /// Removes `units`; fails with `INSUFFICIENT_STOCK` rather than overselling.
    pub async fn purchase_item(&self, id: &str, units: u32) -> Result<u64, ClientError> {
        // ---
        self.increment_quantity(id, -i64::from(units)).await
    }
}
