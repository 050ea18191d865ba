//! services/api/src/adapters/memory.rs
//!
//! Process-local implementations of the storage ports. Used when no
//! `DATABASE_URL` is configured and by the integration tests. Data is lost on
//! restart.

use async_trait::async_trait;
use ledger_digest_core::domain::{Identity, SessionRecord, TransactionRecord};
use ledger_digest_core::ports::{
    CredentialStore, PortError, PortResult, TokenStore, TransactionSink, TransactionSource,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    identities: Mutex<HashMap<String, Identity>>,
    tokens: Mutex<HashMap<String, SessionRecord>>,
    // keyed by (owner, transaction id) so re-uploads replace rows
    transactions: Mutex<HashMap<(Uuid, String), TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> PortResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PortError::Unexpected("in-memory store poisoned".to_string()))
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_if_absent(&self, identity: &Identity) -> PortResult<()> {
        match lock(&self.identities)?.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(PortError::Conflict(format!(
                "Email {} already registered",
                identity.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone());
                Ok(())
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<Identity>> {
        Ok(lock(&self.identities)?.get(email).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn put(&self, record: &SessionRecord) -> PortResult<()> {
        lock(&self.tokens)?.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> PortResult<Option<SessionRecord>> {
        Ok(lock(&self.tokens)?.get(token).cloned())
    }
}

#[async_trait]
impl TransactionSource for MemoryStore {
    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<TransactionRecord>> {
        Ok(lock(&self.transactions)?
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionSink for MemoryStore {
    async fn insert_batch(&self, records: &[TransactionRecord]) -> PortResult<()> {
        let mut rows = lock(&self.transactions)?;
        for record in records {
            rows.insert((record.owner_id, record.id.clone()), record.clone());
        }
        Ok(())
    }
}
