//! crates/ledger_digest_core/src/summary.rs
//!
//! The transaction summary aggregation engine.
//!
//! Records are filtered to a rolling window of calendar days (both ends
//! inclusive) at retrieval time, then reduced with exact decimal arithmetic.
//! The reduction is a pure function of the record set: it does not depend on
//! the order records come back from the store.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{Summary, SummaryWindow, TransactionRecord};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, CredentialStore, TransactionSource};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Fraction digits kept on the reported averages.
const AVERAGE_SCALE: u32 = 2;

#[derive(Clone)]
pub struct SummaryEngine {
    credentials: Arc<dyn CredentialStore>,
    transactions: Arc<dyn TransactionSource>,
    clock: Arc<dyn Clock>,
}

impl SummaryEngine {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        transactions: Arc<dyn TransactionSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            transactions,
            clock,
        }
    }

    /// Summarizes the last `window_days` days of activity for a verified email.
    pub async fn summarize(&self, owner_email: &str, window_days: u32) -> CoreResult<Summary> {
        let identity = self
            .credentials
            .find_by_email(owner_email)
            .await?
            .ok_or_else(|| {
                error!(
                    email = %owner_email,
                    "Verified token has no matching identity; token and credential stores disagree"
                );
                CoreError::AccountNotFound {
                    email: owner_email.to_string(),
                }
            })?;

        let window = SummaryWindow::ending(self.clock.now().date_naive(), window_days);
        let records = self.transactions.list_by_owner(identity.id).await?;
        info!(
            user_id = %identity.id,
            start = %window.start,
            end = %window.end,
            fetched = records.len(),
            "Retrieved transactions for summary"
        );

        let summary = summarize_records(&records, window).map_err(|e| {
            error!(user_id = %identity.id, "Summary aggregation failed: {}", e);
            e
        })?;
        info!(
            user_id = %identity.id,
            count = summary.transaction_count,
            total_balance = %summary.total_balance,
            "Summary computed"
        );
        Ok(summary)
    }
}

/// Reduces the records that fall inside `window` to a [`Summary`].
///
/// Fails with `Unexpected` if a running sum leaves the `Decimal` range.
pub fn summarize_records(
    records: &[TransactionRecord],
    window: SummaryWindow,
) -> CoreResult<Summary> {
    let mut summary = Summary::empty(window);

    let mut credit_sum = Decimal::ZERO;
    let mut credit_count: u32 = 0;
    let mut debit_sum = Decimal::ZERO;
    let mut debit_count: u32 = 0;

    for record in records.iter().filter(|r| window.contains(r.date)) {
        summary.total_balance = checked_sum(summary.total_balance, record.amount)?;
        summary.transaction_count += 1;
        *summary
            .transactions_by_month
            .entry(month_name(record.date))
            .or_insert(0) += 1;

        if record.amount.is_sign_negative() && !record.amount.is_zero() {
            debit_sum = checked_sum(debit_sum, record.amount)?;
            debit_count += 1;
        } else {
            credit_sum = checked_sum(credit_sum, record.amount)?;
            credit_count += 1;
        }
    }

    summary.avg_credit = mean(credit_sum, credit_count);
    summary.avg_debit = mean(debit_sum, debit_count);
    Ok(summary)
}

fn checked_sum(acc: Decimal, amount: Decimal) -> CoreResult<Decimal> {
    acc.checked_add(amount).ok_or_else(|| {
        CoreError::Unexpected(format!("transaction sum overflowed adding {amount}"))
    })
}

/// Arithmetic mean, defined as zero for an empty set.
fn mean(sum: Decimal, count: u32) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (sum / Decimal::from(count))
        .round_dp_with_strategy(AVERAGE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// Groups month buckets in calendar order rather than alphabetical order.
pub fn months_in_calendar_order(by_month: &BTreeMap<String, u32>) -> Vec<(&str, u32)> {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    MONTHS
        .iter()
        .filter_map(|m| by_month.get(*m).map(|count| (*m, *count)))
        .collect()
}
