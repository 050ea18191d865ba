//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{Argon2Hasher, DbAdapter, HttpMailChannel, LocalBlobStore, LogMailChannel, MemoryStore},
    config::Config,
    error::ApiError,
    web::{
        rest::ApiDoc,
        router,
        state::{AppState, Ports},
    },
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::Router;
use ledger_digest_core::ports::{DeliveryChannel, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Storage & Run Migrations ---
    let ports = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            storage_ports(db_adapter, &config)?
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
            storage_ports(Arc::new(MemoryStore::new()), &config)?
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), ports));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wires one storage backend into every storage port, plus the non-storage adapters.
fn storage_ports<S>(store: Arc<S>, config: &Config) -> Result<Ports, ApiError>
where
    S: ledger_digest_core::CredentialStore
        + ledger_digest_core::TokenStore
        + ledger_digest_core::TransactionSource
        + ledger_digest_core::TransactionSink
        + 'static,
{
    let mail: Arc<dyn DeliveryChannel> = match (&config.mail_api_url, &config.mail_api_key) {
        (Some(url), Some(key)) => Arc::new(HttpMailChannel::new(
            url.clone(),
            key.clone(),
            config.mail_sender.clone(),
        )?),
        _ => {
            warn!("MAIL_API_URL not set; summary emails will only be logged");
            Arc::new(LogMailChannel)
        }
    };

    Ok(Ports {
        credentials: store.clone(),
        tokens: store.clone(),
        transactions: store.clone(),
        sink: store,
        blobs: Arc::new(LocalBlobStore::new(config.upload_dir.clone())),
        mail,
        hasher: Arc::new(Argon2Hasher::new()),
        clock: Arc::new(SystemClock),
    })
}
