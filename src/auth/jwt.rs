//! HS256 token issuance and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Lifetime of tokens issued by `JwtKeys::issue` when none is given.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Claims carried by API access tokens.
///
/// Older tokens name the user id `userId` or `id`, sometimes as a number;
/// both are read into `sub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    #[serde(alias = "userId", alias = "id", deserialize_with = "subject_text")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

fn subject_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Subject {
        Text(String),
        Number(i64),
    }

    Ok(match Subject::deserialize(deserializer)? {
        Subject::Text(text) => text,
        Subject::Number(number) => number.to_string(),
    })
}

impl Claims {
    /// Claims for `sub` issued now and valid for `lifetime`.
    pub fn new(sub: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            name: None,
            email: None,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whole seconds until `exp` as seen at `now` (Unix seconds), or `None`
    /// once the token has expired.
    pub fn remaining_secs(&self, now: i64) -> Option<u64> {
        let remaining = self.exp - now;
        (remaining > 0).then_some(remaining as u64)
    }
}

// == JWT Keys ==
/// Shared-secret signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("secret must not be empty".to_string()));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, JwtError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Checks signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}
