//! crates/ledger_digest_core/src/session.rs
//!
//! Bearer-token issuance and verification. This is the single authorization
//! gate for every protected operation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::{SessionRecord, SessionToken};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, TokenStore};

/// How long an issued token stays valid unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct SessionPolicy {
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionPolicy {
    pub fn new(tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(tokens, clock, Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
    }

    pub fn with_ttl(tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { tokens, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues and persists a fresh token for `owner_email`.
    pub async fn issue(&self, owner_email: &str) -> CoreResult<SessionToken> {
        let now = self.clock.now();
        let record = SessionRecord {
            token: generate_token_value(),
            owner_email: owner_email.to_string(),
            expires_at: now + self.ttl,
            created_at: now,
        };

        self.tokens.put(&record).await.map_err(|e| {
            error!(email = %owner_email, "Failed to persist session token: {}", e);
            CoreError::from(e)
        })?;
        info!(email = %owner_email, expires_at = %record.expires_at, "Session token issued");

        Ok(SessionToken {
            value: record.token,
            expires_at: record.expires_at,
        })
    }

    /// Resolves a token to its session, rejecting unknown and expired tokens.
    ///
    /// Store outages surface as `StoreUnavailable` instead of `Unauthorized`.
    pub async fn verify(&self, token: &str) -> CoreResult<SessionRecord> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoreError::Unauthorized);
        }

        let record = self
            .tokens
            .find_by_token(token)
            .await?
            .ok_or_else(|| {
                debug!("Token not found in store");
                CoreError::Unauthorized
            })?;

        if record.is_expired_at(self.clock.now()) {
            debug!(email = %record.owner_email, "Token has expired");
            return Err(CoreError::Unauthorized);
        }

        Ok(record)
    }
}

/// 256 bits from the OS CSPRNG, URL-safe base64 without padding.
fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
