pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::{health_handler, summary_handler, upload_handler};

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::auth::{login_handler, register_handler};
use crate::web::state::AppState;

/// Builds the API router: public auth routes plus bearer-protected routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_body = app_state.config.max_upload_bytes;

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/upload", post(upload_handler))
        .route("/summary", post(summary_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(app_state)
}
