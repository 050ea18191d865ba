//! In-crate fakes for the port traits, used by the unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Identity, MessageId, SessionRecord, TransactionRecord};
use crate::ports::{
    BlobStore, Clock, CredentialStore, DeliveryChannel, PasswordHasher, PortError, PortResult,
    TokenStore, TransactionSink, TransactionSource,
};

pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(rfc3339: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc);
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Stores `"hashed:" + plaintext`; good enough to exercise the flows.
pub struct PrefixHasher;

impl PasswordHasher for PrefixHasher {
    fn hash(&self, plaintext: &str) -> PortResult<String> {
        Ok(format!("hashed:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool> {
        match hash.strip_prefix("hashed:") {
            Some(stored) => Ok(stored == plaintext),
            None => Err(PortError::Unexpected("unreadable hash".into())),
        }
    }
}

/// [`PrefixHasher`] that counts `verify` calls.
#[derive(Default)]
pub struct CountingHasher {
    verifications: AtomicUsize,
}

impl CountingHasher {
    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, plaintext: &str) -> PortResult<String> {
        PrefixHasher.hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        PrefixHasher.verify(plaintext, hash)
    }
}

#[derive(Default)]
pub struct MemoryCredentials {
    rows: Mutex<HashMap<String, Identity>>,
    writes: Mutex<usize>,
}

impl MemoryCredentials {
    pub fn get(&self, email: &str) -> Option<Identity> {
        self.rows.lock().unwrap().get(email).cloned()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn insert_if_absent(&self, identity: &Identity) -> PortResult<()> {
        *self.writes.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&identity.email) {
            return Err(PortError::Conflict(identity.email.clone()));
        }
        rows.insert(identity.email.clone(), identity.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<Identity>> {
        Ok(self.rows.lock().unwrap().get(email).cloned())
    }
}

#[derive(Default)]
pub struct MemoryTokens {
    rows: Mutex<HashMap<String, SessionRecord>>,
    unavailable: AtomicBool,
}

impl MemoryTokens {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn fail_with_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("token store timed out".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryTokens {
    async fn put(&self, record: &SessionRecord) -> PortResult<()> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> PortResult<Option<SessionRecord>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().get(token).cloned())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<TransactionRecord>>,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn with(records: Vec<TransactionRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn fail_with_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<TransactionRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSource for MemoryLedger {
    async fn list_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<TransactionRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionSink for MemoryLedger {
    async fn insert_batch(&self, records: &[TransactionRecord]) -> PortResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("ledger down".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.retain(|r| !(r.owner_id == record.owner_id && r.id == record.id));
            rows.push(record.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobs {
    pub objects: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put_object(&self, key: &str, body: Bytes) -> PortResult<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub destination: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<SentMessage>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send(
        &self,
        destination: &str,
        subject: &str,
        html_body: &str,
    ) -> PortResult<MessageId> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("mail relay refused connection".into()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            destination: destination.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(MessageId(format!("msg-{}", sent.len())))
    }
}
