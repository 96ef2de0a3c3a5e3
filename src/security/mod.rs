//! Password hashing and bearer token lifecycle for the Credential Authority.

mod password;
mod token;

pub use password::{PasswordHasher, DEFAULT_BCRYPT_COST, MAX_PASSWORD_BYTES};
pub use token::{TokenClaims, TokenIssuer, TokenSecret, TOKEN_TTL_SECS};
