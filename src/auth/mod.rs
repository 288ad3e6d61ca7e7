//! Authentication module
//!
//! - Password hashing with bcrypt (run on the blocking pool)
//! - HS256 JWT issuance and validation
//! - Bearer token extraction and role checks

mod password;
mod token;

use thiserror::Error;

pub use password::{hash_password, verify_password};
pub use token::{Identity, TokenService};

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, expiry or claim validation failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signing a token failed.
    #[error("failed to issue token: {0}")]
    Issue(String),

    /// bcrypt failed or its task was cancelled.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
