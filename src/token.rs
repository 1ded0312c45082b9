//! Session-token issuance and verification.
//!
//! Tokens are stateless HS256 JWTs carrying the account identity and an
//! expiry; validity is entirely self-contained. The signing secret and the
//! lifetime come from [`AuthSettings`], validated once at startup.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::config::AuthSettings;

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id the token was issued for.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Error types for token verification and issuance
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session token has expired")]
    Expired,

    #[error("session token is malformed")]
    Malformed,

    #[error("failed to sign session token")]
    Signing,
}

/// Signs and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.signing_secret.as_bytes()),
            ttl_secs: settings.token_ttl_secs,
        }
    }

    /// Issues a token for `account_id` expiring `ttl_secs` from now.
    pub fn issue(&self, account_id: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: account_id.to_owned(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("session token signing failed: {}", e);
            TokenError::Signing
        })
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    /// * `TokenError::Expired` - signature is valid but `now >= exp`
    /// * `TokenError::Malformed` - signature or structure is invalid
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared manually below; the library's default leeway
        // would keep a zero-ttl token valid for another minute.
        validation.validate_exp = false;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if Utc::now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
