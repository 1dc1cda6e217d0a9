/// One-time tokens for email verification and password reset
///
/// A token is 43 random base62 characters. Only its SHA-256 hex digest is
/// stored; the plaintext leaves the server once, in the response or email
/// that delivers it.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 43;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Error type for one-time token handling
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token does not have the expected shape
    #[error("Malformed token")]
    Malformed,

    /// No pending token matches, or it has expired
    #[error("Token is invalid or has expired")]
    InvalidOrExpired,
}

/// What a one-time token is for; decides its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Confirms ownership of an email address
    EmailVerification,

    /// Authorizes one password change
    PasswordReset,
}

impl TokenPurpose {
    /// How long a token of this purpose stays valid
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenPurpose::EmailVerification => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(1),
        }
    }
}

/// A freshly generated token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Plaintext, to be handed to the user
    pub token: String,

    /// SHA-256 hex digest, to be stored
    pub hash: String,

    /// Moment the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Generates a token for `purpose`, expiring relative to `now`
pub fn issue(purpose: TokenPurpose, now: DateTime<Utc>) -> IssuedToken {
    let mut rng = rand::thread_rng();
    let token: String = (0..TOKEN_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    IssuedToken {
        hash: hash_token(&token),
        token,
        expires_at: now + purpose.lifetime(),
    }
}

/// SHA-256 hex digest of a plaintext token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks the token's shape and returns its digest for lookup
pub fn parse(token: &str) -> Result<String, TokenError> {
    let token = token.trim();
    if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(TokenError::Malformed);
    }
    Ok(hash_token(token))
}
