//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::auth::{
    self, LoginRequest, RegisterRequest, RegisterResponse, TokenResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::NaiveDate;
use ledger_digest_core::{CoreError, SessionRecord, Summary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, Modify, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        upload_handler,
        summary_handler,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            TokenResponse,
            UploadResponse,
            SummaryResponse,
            SummaryBody,
            DateRange,
            Delivery,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Ledger Digest API", description = "Register, log in, upload statements and request an emailed 30-day summary.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Optional folder prefix for the stored object key.
    folder: Option<String>,
}

/// The response payload sent after a statement upload.
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    status: String,
    message: String,
    file_name: String,
    path: String,
    accepted: usize,
    rejected: usize,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Window length in days; defaults to the configured window.
    days: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryBody {
    #[schema(value_type = String)]
    total_balance: Decimal,
    transactions_by_month: BTreeMap<String, u32>,
    #[schema(value_type = String)]
    avg_debit: Decimal,
    #[schema(value_type = String)]
    avg_credit: Decimal,
    transaction_count: u32,
    date_range: DateRange,
}

impl From<Summary> for SummaryBody {
    fn from(summary: Summary) -> Self {
        Self {
            total_balance: summary.total_balance,
            transactions_by_month: summary.transactions_by_month,
            avg_debit: summary.avg_debit,
            avg_credit: summary.avg_credit,
            transaction_count: summary.transaction_count,
            date_range: DateRange {
                start: summary.window.start,
                end: summary.window.end,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    Sent { message_id: String },
    Failed { reason: String },
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    status: String,
    message: String,
    summary: SummaryBody,
    delivery: Delivery,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Upload a transaction statement.
///
/// Accepts a multipart/form-data request with a `file` part containing lines of
/// `id,YYYY-MM-DD,amount`. The raw file is stored and its valid rows ingested.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", description = "The statement to upload."),
    params(UploadQuery),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing, empty or invalid file"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(("bearer" = []))
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionRecord>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let name = field.file_name().unwrap_or("statement.csv").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file bytes: {}", e)))?;
        upload = Some((name, data));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| ApiError::BadRequest("Multipart form must include a file".to_string()))?;

    let receipt = state
        .uploads
        .upload(&session, &file_name, query.folder.as_deref(), data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            status: "success".to_string(),
            message: "File uploaded successfully".to_string(),
            file_name,
            path: receipt.key,
            accepted: receipt.accepted,
            rejected: receipt.rejected,
        }),
    ))
}

/// Compute the caller's summary and email it to them.
///
/// A delivery failure still returns the computed summary, with status 502 and
/// `delivery.status = "failed"`.
#[utoipa::path(
    post,
    path = "/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Summary generated and sent", body = SummaryResponse),
        (status = 401, description = "Invalid or expired token"),
        (status = 502, description = "Summary generated but email delivery failed", body = SummaryResponse),
        (status = 503, description = "Backing store unavailable, retry later")
    ),
    security(("bearer" = []))
)]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionRecord>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, ApiError> {
    let days = query.days.unwrap_or(state.config.summary_window_days);
    if days == 0 {
        return Err(CoreError::InvalidInput("days must be at least 1".to_string()).into());
    }

    let summary = state.summaries.summarize(&session.owner_email, days).await?;

    let (status, message, delivery) =
        match state.reports.dispatch(&session.owner_email, &summary).await {
            Ok(id) => (
                StatusCode::OK,
                "Summary generated and sent successfully",
                Delivery::Sent { message_id: id.0 },
            ),
            Err(CoreError::DeliveryFailed(reason)) => {
                warn!(email = %session.owner_email, "Summary computed but not delivered");
                (
                    StatusCode::BAD_GATEWAY,
                    "Summary generated but the email could not be sent",
                    Delivery::Failed { reason },
                )
            }
            Err(other) => return Err(other.into()),
        };

    info!(email = %session.owner_email, status = %status, "Summary request completed");
    let body = SummaryResponse {
        status: if status.is_success() { "success" } else { "partial" }.to_string(),
        message: message.to_string(),
        summary: summary.into(),
        delivery,
    };
    Ok((status, Json(body)).into_response())
}
