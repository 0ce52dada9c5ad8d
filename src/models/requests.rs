//! Request DTOs for the service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /auth/revoke
///
/// # Fields
/// - `token`: The raw token to revoke
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeRequest {
    /// The raw token
    pub token: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl RevokeRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.token.trim().is_empty() {
            return Some("Token cannot be empty".to_string());
        }
        if self.ttl == Some(0) {
            return Some("TTL must be at least one second".to_string());
        }
        None
    }
}
