//! crates/ledger_digest_core/src/auth.rs
//!
//! Registration and login. Registration is a single conditional write keyed by
//! email; login verifies the stored hash and hands off to the session policy.
//! Login with an unknown email still runs one hash verification, against a
//! placeholder hash, so both failure paths cost the same.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{Identity, PublicIdentity, SessionToken};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, CredentialStore, PasswordHasher, PortError};
use crate::session::SessionPolicy;

#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: SessionPolicy,
    clock: Arc<dyn Clock>,
    /// Verified against when the email is unknown; `None` if hashing failed at startup.
    placeholder_hash: Option<Arc<str>>,
}

/// Plaintext behind the placeholder hash.
const PLACEHOLDER_PASSWORD: &str = "ledger-digest-placeholder";

impl Authenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: SessionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let placeholder_hash = match hasher.hash(PLACEHOLDER_PASSWORD) {
            Ok(hash) => Some(Arc::from(hash)),
            Err(e) => {
                error!("Failed to prepare placeholder password hash: {}", e);
                None
            }
        };
        Self {
            credentials,
            hasher,
            sessions,
            clock,
            placeholder_hash,
        }
    }

    /// Creates a new identity, or `AlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        plaintext_password: &str,
        display_name: &str,
    ) -> CoreResult<PublicIdentity> {
        let password_hash = self.hasher.hash(plaintext_password).map_err(|e| {
            error!("Failed to hash password: {}", e);
            CoreError::Unexpected(e.to_string())
        })?;

        let now = self.clock.now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        };

        match self.credentials.insert_if_absent(&identity).await {
            Ok(()) => {
                info!(email = %email, id = %identity.id, "User registered");
                Ok(identity.to_public())
            }
            Err(PortError::Conflict(_)) => {
                warn!(email = %email, "Registration rejected: email already exists");
                Err(CoreError::AlreadyExists)
            }
            Err(e) => {
                error!(email = %email, "Failed to create user: {}", e);
                Err(e.into())
            }
        }
    }

    /// Verifies the credentials and issues a session token.
    pub async fn login(&self, email: &str, plaintext_password: &str) -> CoreResult<SessionToken> {
        let Some(identity) = self.credentials.find_by_email(email).await? else {
            if let Some(hash) = &self.placeholder_hash {
                let _ = self.hasher.verify(plaintext_password, hash);
            }
            warn!(email = %email, "Authentication failed: user not found");
            return Err(CoreError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify(plaintext_password, &identity.password_hash)
            .map_err(|e| {
                error!(email = %email, "Failed to parse stored password hash: {}", e);
                CoreError::Unexpected(e.to_string())
            })?;

        if !valid {
            warn!(email = %email, "Authentication failed: invalid password");
            return Err(CoreError::InvalidCredentials);
        }

        self.sessions.issue(&identity.email).await
    }
}
