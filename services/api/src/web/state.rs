//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chrono::Duration;
use ledger_digest_core::ports::{
    BlobStore, Clock, CredentialStore, DeliveryChannel, PasswordHasher, TokenStore,
    TransactionSink, TransactionSource,
};
use ledger_digest_core::{
    Authenticator, ReportDispatcher, SessionPolicy, SummaryEngine, UploadService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Holds only the core services; every piece of mutable state lives behind the ports.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Authenticator,
    pub sessions: SessionPolicy,
    pub summaries: SummaryEngine,
    pub reports: ReportDispatcher,
    pub uploads: UploadService,
}

/// The concrete adapters the core services are wired to.
pub struct Ports {
    pub credentials: Arc<dyn CredentialStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub transactions: Arc<dyn TransactionSource>,
    pub sink: Arc<dyn TransactionSink>,
    pub blobs: Arc<dyn BlobStore>,
    pub mail: Arc<dyn DeliveryChannel>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: Arc<Config>, ports: Ports) -> Self {
        let sessions = SessionPolicy::with_ttl(
            ports.tokens,
            ports.clock.clone(),
            Duration::minutes(config.token_ttl_minutes),
        );
        let authenticator = Authenticator::new(
            ports.credentials.clone(),
            ports.hasher,
            sessions.clone(),
            ports.clock.clone(),
        );
        let summaries =
            SummaryEngine::new(ports.credentials.clone(), ports.transactions, ports.clock);
        let reports = ReportDispatcher::new(ports.mail);
        let uploads = UploadService::new(ports.credentials, ports.blobs, ports.sink);

        Self {
            config,
            authenticator,
            sessions,
            summaries,
            reports,
            uploads,
        }
    }
}
