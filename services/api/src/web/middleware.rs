//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use ledger_digest_core::session::bearer_token;
use ledger_digest_core::CoreError;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the session.
///
/// If valid, inserts the `SessionRecord` into request extensions for handlers to use.
/// Missing, malformed, unknown or expired tokens get 401; store outages get 503.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token from the Authorization header
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(CoreError::Unauthorized)?
        .to_string();

    // 2. Validate against the token store
    let session = state.sessions.verify(&token).await?;

    // 3. Insert the session into request extensions
    req.extensions_mut().insert(session);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
