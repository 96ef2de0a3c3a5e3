//! HS256 bearer tokens.
//!
//! A token is a signed, typed claim set. Validity depends only on the
//! signature and the embedded expiry; nothing is stored server-side.

use crate::error::ServiceError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifetime of an issued token (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Symmetric signing secret. Never printed.
#[derive(Clone)]
pub struct TokenSecret(String);

impl TokenSecret {
    /// Wraps `secret`, refusing an empty or blank value.
    pub fn new(secret: impl Into<String>) -> anyhow::Result<Self> {
        // ---
        let secret = secret.into();
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        // ---
        self.0.as_bytes()
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.write_str("TokenSecret(<redacted>)")
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    // ---
    /// Username the token was issued to.
    pub sub: String,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,

    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,
}

/// Issues and validates tokens with one secret.
#[derive(Clone)]
pub struct TokenIssuer {
    // ---
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    // ---
    pub fn new(secret: &TokenSecret) -> Self {
        // ---
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: TOKEN_TTL_SECS,
        }
    }

    /// Issues a token for `username` valid from now.
    pub fn issue(&self, username: &str) -> Result<String, ServiceError> {
        // ---
        self.issue_at(username, Utc::now())
    }

    /// Issues a token for `username` as if it were issued at `issued_at`.
    pub fn issue_at(&self, username: &str, issued_at: DateTime<Utc>) -> Result<String, ServiceError> {
        // ---
        let iat = issued_at.timestamp();
        let claims = TokenClaims {
            sub: username.to_string(),
            exp: iat + self.ttl_secs,
            iat,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {e}")))
    }

    /// Verifies signature, structure and expiry in one step.
    ///
    /// # Errors
    /// Every failure is reported as [`ServiceError::Token`].
    pub fn validate(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        // ---
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {:?}", e.kind());
                ServiceError::Token
            })?;

        if data.claims.sub.is_empty() {
            tracing::debug!("Token rejected: empty subject");
            return Err(ServiceError::Token);
        }

        Ok(data.claims)
    }
}
