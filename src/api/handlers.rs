//! API Handlers
//!
//! HTTP request handlers for each service endpoint.

use std::sync::Arc;

use axum::{extract::State, http::HeaderValue, Extension, Json};
use chrono::Utc;
use tracing::warn;

use super::rate_limit::ClientRateLimiter;
use crate::auth::{token_digest, Claims, JwtKeys, RevocationGuard};
use crate::cache::QueryCache;
use crate::error::{ApiError, Result};
use crate::models::{
    HealthResponse, LogoutResponse, RevokeRequest, RevokeResponse, SessionResponse,
    StatsResponse,
};
use crate::store::{KvStore, MemoryStore, SharedStore};

/// Application state shared across all handlers.
///
/// One store handle feeds both the cache facade and the revocation guard.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// Set when the store is in-process, for stats
    pub memory: Option<MemoryStore>,
    pub cache: QueryCache,
    pub guard: RevocationGuard,
    pub jwt: JwtKeys,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Arc<Vec<HeaderValue>>,
    pub rate_limiter: Option<ClientRateLimiter>,
}

impl AppState {
    /// Creates a new AppState over an already constructed store.
    pub fn new(store: SharedStore, jwt: JwtKeys, default_ttl: u64) -> Self {
        Self {
            cache: QueryCache::with_default_ttl(store.clone(), default_ttl),
            guard: RevocationGuard::with_default_ttl(store.clone(), default_ttl),
            store,
            memory: None,
            jwt,
            cors_origins: Arc::new(Vec::new()),
            rate_limiter: None,
        }
    }

    /// Creates a new AppState backed by an in-process store.
    pub fn with_memory_store(memory: MemoryStore, jwt: JwtKeys, default_ttl: u64) -> Self {
        let mut state = Self::new(Arc::new(memory.clone()), jwt, default_ttl);
        state.memory = Some(memory);
        state
    }

    /// Restricts CORS to `origins`. A `*` entry or an empty list allows any
    /// origin; entries that are not valid header values are skipped.
    pub fn with_cors_origins(mut self, origins: &[String]) -> Self {
        if origins.iter().any(|origin| origin == "*") {
            self.cors_origins = Arc::new(Vec::new());
            return self;
        }

        let parsed = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        self.cors_origins = Arc::new(parsed);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Option<ClientRateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }
}

/// Verified caller identity, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Raw bearer token
    pub token: String,
    pub claims: Claims,
}

impl AuthContext {
    /// Seconds until the token expires, at least one.
    fn remaining_secs(&self) -> u64 {
        self.claims
            .remaining_secs(Utc::now().timestamp())
            .unwrap_or(1)
            .max(1)
    }
}

/// Handler for GET /auth/session
///
/// Returns the caller's session, cached per token for no longer than the
/// token itself lives.
pub async fn session_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<SessionResponse>> {
    let key = format!("session:{}", token_digest(&ctx.token));
    let ttl = ctx.remaining_secs().min(state.cache.default_ttl());

    let session = state
        .cache
        .cache_query_with_ttl(&key, ttl, || async {
            Ok::<_, ApiError>(Some(SessionResponse::from(&ctx.claims)))
        })
        .await?
        .ok_or_else(|| ApiError::Internal("session lookup produced no value".to_string()))?;

    Ok(Json(session))
}

/// Handler for POST /auth/logout
///
/// Revokes the caller's own token until it would have expired anyway.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<LogoutResponse>> {
    let ttl = ctx.remaining_secs();
    state.guard.blacklist_token_with_ttl(&ctx.token, ttl).await?;

    Ok(Json(LogoutResponse::new(ttl)))
}

/// Handler for POST /auth/revoke
///
/// Revokes an arbitrary token on behalf of an authenticated caller.
pub async fn revoke_handler(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<RevokeResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or_else(|| state.guard.default_ttl());
    state.guard.blacklist_token_with_ttl(&req.token, ttl).await?;

    Ok(Json(RevokeResponse::new(ttl)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = match &state.memory {
        Some(memory) => Some(memory.stats().await),
        None => None,
    };

    Json(StatsResponse::new(
        state.cache.stats(),
        state.guard.stats(),
        store,
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.store.name()))
}
