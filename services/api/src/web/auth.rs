//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration and login.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Boundary Validation
//=========================================================================================

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if !email_pattern().is_match(&req.email) {
        return Err(ApiError::BadRequest("A valid email address is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = RegisterResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 503, description = "Backing store unavailable, retry later")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&req)?;

    let user = state
        .authenticator
        .register(&req.email, &req.password, req.name.trim())
        .await?;

    let response = RegisterResponse {
        id: user.id,
        email: user.email,
        name: user.display_name,
        created_at: user.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Incorrect email or password"),
        (status = 503, description = "Backing store unavailable, retry later")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.authenticator.login(&req.email, &req.password).await?;
    info!(email = %req.email, "Login successful");

    Ok(Json(TokenResponse {
        access_token: token.value,
        token_type: "bearer".to_string(),
        expires_at: token.expires_at,
    }))
}
