//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, logout_handler, revoke_handler, session_handler, stats_handler, AppState,
};
use super::middleware::require_auth;
use super::rate_limit::rate_limit;

/// Response headers added to every response unless a handler set them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
         form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
         object-src 'none';script-src 'self';script-src-attr 'none';\
         style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// CORS for the configured origins, or any origin when none are set.
/// Requests without an `Origin` header are unaffected.
fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Auth: bearer parsing, signature check and revocation check on `/auth/*`
/// - Rate limit: per client IP, when configured
/// - Security headers: on every response
/// - CORS: configured origins, any origin when unset
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/session", get(session_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/revoke", post(revoke_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    SECURITY_HEADERS
        .iter()
        .fold(router, |router, &(name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            ))
        })
        .layer(cors_layer(&state.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
