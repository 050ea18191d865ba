//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the storage ports from the `core` crate. It handles all interactions with
//! the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledger_digest_core::domain::{Identity, SessionRecord, TransactionRecord};
use ledger_digest_core::ports::{
    CredentialStore, PortError, PortResult, TokenStore, TransactionSink, TransactionSource,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Separates transient failures, which callers may retry, from everything else.
fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        sqlx::Error::RowNotFound => PortError::NotFound(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct IdentityRecord {
    id: Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl IdentityRecord {
    fn to_domain(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            password_hash: self.password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SessionTokenRecord {
    token: String,
    owner_email: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}
impl SessionTokenRecord {
    fn to_domain(self) -> SessionRecord {
        SessionRecord {
            token: self.token,
            owner_email: self.owner_email,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    owner_id: Uuid,
    date: NaiveDate,
    amount: Decimal,
}
impl TransactionRow {
    fn to_domain(self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            owner_id: self.owner_id,
            date: self.date,
            amount: self.amount,
        }
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn insert_if_absent(&self, identity: &Identity) -> PortResult<()> {
        // Single conditional write: no row back means the unique email index won.
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO identities (id, email, display_name, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING id",
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match inserted {
            Some(_) => Ok(()),
            None => Err(PortError::Conflict(format!(
                "Email {} already registered",
                identity.email
            ))),
        }
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<Identity>> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "SELECT id, email, display_name, password_hash, created_at, updated_at \
             FROM identities WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(record.map(IdentityRecord::to_domain))
    }
}

#[async_trait]
impl TokenStore for DbAdapter {
    async fn put(&self, record: &SessionRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO session_tokens (token, owner_email, expires_at, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&record.token)
        .bind(&record.owner_email)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> PortResult<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionTokenRecord>(
            "SELECT token, owner_email, expires_at, created_at FROM session_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(record.map(SessionTokenRecord::to_domain))
    }
}

#[async_trait]
impl TransactionSource for DbAdapter {
    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRow>(
            "SELECT id, owner_id, date, amount FROM transactions WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(TransactionRow::to_domain).collect())
    }
}

#[async_trait]
impl TransactionSink for DbAdapter {
    async fn insert_batch(&self, records: &[TransactionRecord]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for record in records {
            sqlx::query(
                "INSERT INTO transactions (id, owner_id, date, amount) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (owner_id, id) DO UPDATE SET date = EXCLUDED.date, amount = EXCLUDED.amount",
            )
            .bind(&record.id)
            .bind(record.owner_id)
            .bind(record.date)
            .bind(record.amount)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
