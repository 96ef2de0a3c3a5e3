//! Credential Authority: account creation, password verification, and
//! token issuance/validation.

use crate::domain::{MetricsPtr, NewUser, StoreProbe, UserId, UserRepositoryPtr};
use crate::error::{ServiceError, StoreError};
use crate::security::{PasswordHasher, TokenIssuer, MAX_PASSWORD_BYTES};
use std::ops::RangeInclusive;

/// Allowed username length, in characters.
pub const USERNAME_LEN: RangeInclusive<usize> = 3..=20;

/// Allowed password length, in characters.
pub const PASSWORD_LEN: RangeInclusive<usize> = 8..=20;

/// Owns the user store handle for the lifetime of the process.
pub struct CredentialAuthority {
    // ---
    users: UserRepositoryPtr,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    metrics: MetricsPtr,
}

fn check_length(field: &str, value: &str, range: RangeInclusive<usize>) -> Result<(), ServiceError> {
    // ---
    let len = value.chars().count();
    if range.contains(&len) {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "{field} must be between {} and {} characters",
            range.start(),
            range.end()
        )))
    }
}

impl CredentialAuthority {
    // ---
    pub fn new(
        users: UserRepositoryPtr,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        metrics: MetricsPtr,
    ) -> Self {
        // ---
        Self {
            users,
            hasher,
            tokens,
            metrics,
        }
    }

    /// Creates an account and returns its id.
    ///
    /// # Errors
    /// - `Validation` if username or password length is out of range
    /// - `AlreadyExists` if the username is taken, including when a concurrent
    ///   create wins the race and the store's unique constraint fires
    #[tracing::instrument(skip(self, password))]
    pub async fn create_user(&self, username: &str, password: &str) -> Result<UserId, ServiceError> {
        // ---
        check_length("username", username, USERNAME_LEN)?;
        check_length("password", password, PASSWORD_LEN)?;
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ServiceError::validation(format!(
                "password must not exceed {MAX_PASSWORD_BYTES} bytes"
            )));
        }

        if self.users.find_user_by_username(username).await?.is_some() {
            tracing::info!("Username already taken");
            return Err(ServiceError::AlreadyExists(format!("user '{username}'")));
        }

        let password_hash = self.hasher.hash(password).await?;

        let user = self
            .users
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation => {
                    tracing::info!("Lost create race for username");
                    ServiceError::AlreadyExists(format!("user '{username}'"))
                }
                other => other.into(),
            })?;

        self.metrics.record_user_created();
        tracing::info!(user_id = %user.id, "Created user");

        Ok(user.id)
    }

    /// Verifies credentials and issues a 24-hour token.
    ///
    /// Unknown users and wrong passwords fail identically, after the same
    /// amount of hashing work.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ServiceError> {
        // ---
        if username.is_empty() {
            return Err(ServiceError::validation("username is required"));
        }
        if password.is_empty() {
            return Err(ServiceError::validation("password is required"));
        }

        let user = self.users.find_user_by_username(username).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
        let verified = self.hasher.verify(password, stored_hash).await?;

        match user {
            Some(user) if verified => {
                let token = self.tokens.issue(&user.username)?;
                self.metrics.record_authentication(true);
                tracing::info!("Authenticated user");
                Ok(token)
            }
            _ => {
                self.metrics.record_authentication(false);
                tracing::warn!("Authentication failed");
                Err(ServiceError::Authentication)
            }
        }
    }

    /// Returns the username a valid token was issued to.
    ///
    /// Pure: does not touch the store.
    pub fn validate_token(&self, token: &str) -> Result<String, ServiceError> {
        // ---
        self.tokens.validate(token).map(|claims| claims.sub)
    }
}

#[async_trait::async_trait]
impl StoreProbe for CredentialAuthority {
    // ---
    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        self.users.ping().await
    }
}
