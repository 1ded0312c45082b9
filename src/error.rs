//! Service-level error taxonomy.
//!
//! Every engine operation returns one of these kinds; all are recoverable
//! and typed, never unstructured panics. Messages stay generic: storage
//! detail is logged at the mapping site and a password hash never appears in
//! any of them. Callers translate kinds to their wire format.

use thiserror::Error;
use tracing::error;

use crate::auth::password::HashError;
use crate::db::StoreError;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Client-supplied data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The normalized email already exists within the tenant.
    #[error("email is already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password. The two cases share one kind so a
    /// response cannot reveal whether the account exists.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account is locked pending external remediation.
    #[error("account is locked")]
    AccountLocked,

    /// The referenced account no longer exists.
    #[error("account not found")]
    NotFound,

    /// The tenant's storage could not be reached. Detail is logged, not surfaced.
    #[error("tenant storage unavailable")]
    TenantUnavailable,

    /// Valid signature, past expiry; callers may prompt re-authentication.
    #[error("session token has expired")]
    ExpiredToken,

    /// Invalid signature or structure; callers should reject outright.
    #[error("session token is malformed")]
    MalformedToken,

    /// Unexpected failure with no caller-actionable cause.
    #[error("internal error")]
    Internal,
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Unavailable(detail) => {
                error!(%detail, "tenant storage unavailable");
                AuthError::TenantUnavailable
            }
            StoreError::Hash(HashError::WeakInput(min)) => {
                AuthError::InvalidInput(format!("password must be at least {min} characters"))
            }
            StoreError::Hash(HashError::Hashing) => {
                error!("password hash derivation failed in store");
                AuthError::Internal
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::Signing => AuthError::Internal,
        }
    }
}
