//! crates/ledger_digest_core/src/statement.rs
//!
//! Parser for uploaded transaction statements. One transaction per line:
//! `id,YYYY-MM-DD,amount`. Bad lines are reported and skipped.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::TransactionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number within the uploaded text.
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStatement {
    pub records: Vec<TransactionRecord>,
    pub rejected: Vec<RejectedLine>,
}

pub fn parse_statement(owner_id: Uuid, text: &str) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();
    let mut seen_content = false;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let first_content_line = !seen_content;
        seen_content = true;

        match parse_line(line) {
            Ok((id, date, amount)) => parsed.records.push(TransactionRecord {
                id,
                owner_id,
                date,
                amount,
            }),
            Err(_) if first_content_line && looks_like_header(line) => {}
            Err(reason) => parsed.rejected.push(RejectedLine {
                line: line_no,
                reason,
            }),
        }
    }

    parsed
}

fn parse_line(line: &str) -> Result<(String, NaiveDate, Decimal), String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 fields, got {}", parts.len()));
    }

    let id = parts[0];
    if id.is_empty() {
        return Err("missing transaction id".to_string());
    }
    let date = NaiveDate::parse_from_str(parts[1], "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", parts[1], e))?;
    let amount = parse_amount(parts[2]).ok_or_else(|| format!("invalid amount '{}'", parts[2]))?;

    Ok((id.to_string(), date, amount))
}

/// Fraction digits a stored amount may carry.
const AMOUNT_SCALE: u32 = 2;

/// Integer digits a stored amount may carry; amounts are persisted as NUMERIC(14,2).
const AMOUNT_INTEGER_DIGITS: u32 = 12;

/// Accepts an optional leading `+` and at most two fraction digits. Rejects
/// anything outside the persisted range, and forms `Decimal` tolerates but a
/// statement should not carry, such as digit separators.
fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() || s.contains('_') {
        return None;
    }
    let amount = s.parse::<Decimal>().ok()?;
    if amount.scale() > AMOUNT_SCALE {
        return None;
    }
    let limit = Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS));
    (amount.abs() < limit).then_some(amount)
}

fn looks_like_header(line: &str) -> bool {
    line.split(',')
        .all(|field| field.trim().chars().all(|c| c.is_alphabetic() || c.is_whitespace()))
}
