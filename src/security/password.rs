//! bcrypt-backed password hashing.
//!
//! Hashing and verification are CPU-bound and run on the blocking thread
//! pool so they never stall the async workers.

use crate::error::ServiceError;
use anyhow::{ensure, Result};
use std::sync::Arc;

/// Cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// bcrypt ignores input past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Hashes and verifies passwords at a fixed bcrypt cost.
#[derive(Clone)]
pub struct PasswordHasher {
    // ---
    cost: u32,

    /// Verified against when the user does not exist, so both failure paths
    /// cost the same.
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Builds a hasher for `cost`.
    ///
    /// # Errors
    /// Returns an error if `cost` is outside bcrypt's 4..=31 range.
    pub fn new(cost: u32) -> Result<Self> {
        // ---
        ensure!(
            (MIN_COST..=MAX_COST).contains(&cost),
            "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
        );

        let dummy_hash = bcrypt::hash("storefront-dummy-password", cost)?;

        Ok(Self {
            cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn cost(&self) -> u32 {
        // ---
        self.cost
    }

    /// Derives a salted hash of `password`.
    ///
    /// # Errors
    /// `Validation` if `password` is longer than [`MAX_PASSWORD_BYTES`].
    pub async fn hash(&self, password: &str) -> Result<String, ServiceError> {
        // ---
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ServiceError::validation(format!(
                "password must not exceed {MAX_PASSWORD_BYTES} bytes"
            )));
        }

        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ServiceError::Internal(format!("hash task failed: {e}")))?
            .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
    }

    /// Checks `password` against `stored_hash`.
    ///
    /// With no stored hash the password is still checked against a dummy hash
    /// and the result is always `false`.
    pub async fn verify(&self, password: &str, stored_hash: Option<&str>) -> Result<bool, ServiceError> {
        // ---
        let known = stored_hash.is_some();
        let hash = stored_hash
            .map(str::to_owned)
            .unwrap_or_else(|| self.dummy_hash.to_string());
        let password = password.to_owned();

        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ServiceError::Internal(format!("verify task failed: {e}")))?
            .map_err(|e| ServiceError::Internal(format!("stored hash unreadable: {e}")))?;

        Ok(known && matched)
    }
}
