//! crates/ledger_digest_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mail APIs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Identity, MessageId, SessionRecord, TransactionRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A conditional write lost against an existing row.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Transient backing-service failure (timeouts, closed pools, connection loss).
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts the identity only if no identity with the same email exists.
    ///
    /// Must be a single atomic conditional write. Returns `PortError::Conflict`
    /// when the email is already taken; the existing row is left untouched.
    async fn insert_if_absent(&self, identity: &Identity) -> PortResult<()>;

    /// Exact, case-sensitive lookup. `Ok(None)` means no such identity.
    async fn find_by_email(&self, email: &str) -> PortResult<Option<Identity>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, record: &SessionRecord) -> PortResult<()>;

    /// Returns the stored row even when it is expired; expiry is the caller's call.
    async fn find_by_token(&self, token: &str) -> PortResult<Option<SessionRecord>>;
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<TransactionRecord>>;
}

#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Persists parsed statement rows. Rows whose id already exists for the
    /// owner are replaced, so re-uploading a file does not double count.
    async fn insert_batch(&self, records: &[TransactionRecord]) -> PortResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> PortResult<()>;
}

//=========================================================================================
// Delivery, Hashing and Time Ports
//=========================================================================================

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Sends an HTML message and returns the provider's message id.
    async fn send(&self, destination: &str, subject: &str, html_body: &str)
        -> PortResult<MessageId>;
}

/// One-way salted password hashing. CPU-bound, so deliberately synchronous.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> PortResult<String>;

    /// `Ok(false)` for a mismatch; `Err` only when the stored hash is unreadable.
    fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
