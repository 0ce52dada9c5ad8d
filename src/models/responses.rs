//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::auth::{Claims, GuardStats};
use crate::cache::QueryCacheStats;
use crate::store::StoreStats;

/// Response body for GET /auth/session
///
/// Also the value cached per token, hence `Deserialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Token expiry (Unix seconds)
    pub expires_at: i64,
}

impl From<&Claims> for SessionResponse {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            name: claims.name.clone(),
            email: claims.email.clone(),
            expires_at: claims.exp,
        }
    }
}

/// Response body for POST /auth/logout
#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    /// Success message
    pub message: String,
    /// How long the revocation record lives
    pub revoked_for_secs: u64,
}

impl LogoutResponse {
    pub fn new(revoked_for_secs: u64) -> Self {
        Self {
            message: "Logged out successfully".to_string(),
            revoked_for_secs,
        }
    }
}

/// Response body for POST /auth/revoke
#[derive(Debug, Clone, Serialize)]
pub struct RevokeResponse {
    /// Success message
    pub message: String,
    /// How long the revocation record lives
    pub revoked_for_secs: u64,
}

impl RevokeResponse {
    pub fn new(revoked_for_secs: u64) -> Self {
        Self {
            message: "Token revoked".to_string(),
            revoked_for_secs,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Cache facade counters
    pub cache: QueryCacheStats,
    /// Cache hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Revocation guard counters
    pub revocation: GuardStats,
    /// In-process store counters, absent for external stores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreStats>,
}

impl StatsResponse {
    pub fn new(cache: QueryCacheStats, revocation: GuardStats, store: Option<StoreStats>) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            revocation,
            store,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Store backend name
    pub store: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(store: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            store: store.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
