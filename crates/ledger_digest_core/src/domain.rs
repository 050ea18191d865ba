//! crates/ledger_digest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

// Only used internally for registration/login - contains the password hash
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Strips the password hash for anything that leaves the core.
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Represents a registered user as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicIdentity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// An issued bearer token as handed back to the client after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// The server-side row stored for each issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub owner_email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A token is expired at or after its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A single signed movement on a user's account, dated to the calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: String,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// The inclusive calendar-day range a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SummaryWindow {
    /// The window of `days` calendar days ending on `today`, both ends inclusive.
    pub fn ending(today: NaiveDate, days: u32) -> Self {
        let start = today
            .checked_sub_days(chrono::Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Aggregate statistics over the transactions in a window. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_balance: Decimal,
    pub transactions_by_month: BTreeMap<String, u32>,
    pub avg_debit: Decimal,
    pub avg_credit: Decimal,
    pub transaction_count: u32,
    pub window: SummaryWindow,
}

impl Summary {
    pub fn empty(window: SummaryWindow) -> Self {
        Self {
            total_balance: Decimal::ZERO,
            transactions_by_month: BTreeMap::new(),
            avg_debit: Decimal::ZERO,
            avg_credit: Decimal::ZERO,
            transaction_count: 0,
            window,
        }
    }
}

/// Identifier returned by the delivery channel for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageId(pub String);

/// Result of a file upload: where the raw file went and how its rows fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub key: String,
    pub accepted: usize,
    pub rejected: usize,
}
