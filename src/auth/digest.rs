//! Token digests and bearer header parsing.

use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Hex-encoded SHA-256 of the raw token. Always 64 characters.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extracts `<token>` from an `Authorization: Bearer <token>` value.
///
/// The scheme is case-sensitive and the token must be a single non-empty
/// word.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
