//! Credential Authority routes.

use crate::app_state::AppState;
use crate::error::ServiceError;
use crate::handlers::shared_types::json_body;
use crate::services::CredentialAuthority;
use crate::wire::{
    ApiResponse, AuthenticateRequest, AuthenticateResponse, CreateUserRequest, CreateUserResponse,
    ValidateTokenRequest, ValidateTokenResponse,
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

type CredentialState = State<AppState<CredentialAuthority>>;

/// POST /users
///
/// # Request Body
/// ```json
/// { "username": "alice", "password": "password1" }
/// ```
///
/// # Responses
/// - `201 Created` with `{"data":{"user_id": "..."}}`
/// - `400` for out-of-range lengths, `409` if the username is taken
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): CredentialState,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<CreateUserResponse>), ServiceError> {
    // ---
    let req = json_body(payload)?;

    let user_id = state.service().create_user(&req.username, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(CreateUserResponse { user_id }),
    ))
}

/// POST /authenticate
///
/// Returns a bearer token valid for 24 hours. Unknown users and wrong
/// passwords both answer `401 AUTHENTICATION_ERROR` with the same message.
#[tracing::instrument(skip_all)]
pub async fn authenticate(
    State(state): CredentialState,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthenticateResponse>, ServiceError> {
    // ---
    let req = json_body(payload)?;

    let token = state.service().authenticate(&req.username, &req.password).await?;

    Ok(ApiResponse::new(AuthenticateResponse { token }))
}

/// POST /tokens/validate
#[tracing::instrument(skip_all)]
pub async fn validate_token(
    State(state): CredentialState,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<ApiResponse<ValidateTokenResponse>, ServiceError> {
    // ---
    let req = json_body(payload)?;

    let username = state.service().validate_token(&req.token)?;

    Ok(ApiResponse::new(ValidateTokenResponse { username }))
}
