//! Error types for the cache and revocation service
//!
//! Store faults, caller faults and their HTTP mapping, using thiserror.

use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failure talking to the key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection lost, refused, timed out or never established
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded
    #[error("malformed entry for key {key}: {reason}")]
    Malformed { key: String, reason: String },

    /// The store refused the request shape (key length, TTL, value size)
    #[error("invalid store request: {0}")]
    InvalidRequest(String),
}

// == Auth Error ==
/// Rejection produced while authenticating a request.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Header missing or not `Bearer <token>`
    #[error("No valid token provided.")]
    MissingToken,

    /// Signature, expiry or claims check failed
    #[error("Invalid or expired token.")]
    InvalidToken,

    /// Token is on the revocation list
    #[error("Token is blacklisted.")]
    Revoked,

    /// Revocation lookup could not be completed
    #[error("Internal server error.")]
    StoreFault(#[source] StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::Revoked => {
                StatusCode::FORBIDDEN
            }
            AuthError::StoreFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::StoreFault(source) = &self {
            error!(error = %source, "Revocation check failed");
        }
        let body = Json(ErrorResponse::new(self.to_string()));
        (self.status(), body).into_response()
    }
}

// == Api Error ==
/// Unified error type for HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The store rejected or failed a write the caller depends on
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Client exceeded its request quota
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => {
                error!(error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            ApiError::RateLimited { retry_after } => {
                let body = Json(ErrorResponse::new(
                    "Too many requests, please try again later.",
                ));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(RETRY_AFTER, retry_after.to_string())],
                    body,
                )
                    .into_response();
            }
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_faults_are_forbidden() {
        assert_eq!(AuthError::MissingToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Revoked.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_store_fault_is_internal_error() {
        let err = AuthError::StoreFault(StoreError::Unavailable("down".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error.");
    }

    #[test]
    fn test_api_error_status_codes() {
        let bad = ApiError::InvalidRequest("nope".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let store = ApiError::from(StoreError::Unavailable("down".to_string()));
        let store = store.into_response();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let auth = ApiError::from(AuthError::Revoked).into_response();
        assert_eq!(auth.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 42 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }
}
