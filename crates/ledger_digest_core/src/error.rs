//! crates/ledger_digest_core/src/error.rs
//!
//! The error taxonomy surfaced by the core services to the boundary layer.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Registration hit an email that is already taken.
    #[error("An account with this email already exists")]
    AlreadyExists,

    /// Unknown email or wrong password; intentionally does not say which.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Missing, unknown, malformed or expired bearer token.
    #[error("Invalid or expired token")]
    Unauthorized,

    /// A verified token points at an email with no identity record.
    #[error("Account not found for {email}")]
    AccountNotFound { email: String },

    /// A backing store timed out or is unreachable. Safe to retry.
    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(String),

    /// The summary was computed but could not be delivered.
    #[error("Report delivery failed: {0}")]
    DeliveryFailed(String),

    /// The caller sent something the core refuses to process.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// Default mapping for port failures whose meaning does not depend on the call site.
impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
            other => CoreError::Unexpected(other.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
