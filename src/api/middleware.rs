//! Authentication middleware for protected routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::handlers::{AppState, AuthContext};
use crate::auth::parse_bearer;
use crate::error::AuthError;

/// Parses the bearer token, verifies its signature, then consults the
/// revocation guard. Only then does the request reach the handler, with an
/// `AuthContext` extension attached.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = parse_bearer(header)?.to_owned();

    let claims = state.jwt.verify(&token).map_err(|e| {
        debug!(error = %e, "Token verification failed");
        AuthError::InvalidToken
    })?;

    state.guard.ensure_not_revoked(&token).await?;

    request.extensions_mut().insert(AuthContext { token, claims });
    Ok(next.run(request).await)
}
