//! API Module
//!
//! HTTP handlers and routing for the service.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache and revocation counters
//! - `GET /auth/session` - Caller's session (authenticated)
//! - `POST /auth/logout` - Revoke the caller's token (authenticated)
//! - `POST /auth/revoke` - Revoke another token (authenticated)

pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

pub use handlers::*;
pub use middleware::require_auth;
pub use rate_limit::ClientRateLimiter;
pub use routes::create_router;
