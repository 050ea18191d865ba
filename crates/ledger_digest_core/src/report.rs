//! crates/ledger_digest_core/src/report.rs
//!
//! Renders a [`Summary`] into an email and hands it to the delivery channel.

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{MessageId, Summary};
use crate::error::{CoreError, CoreResult};
use crate::ports::DeliveryChannel;
use crate::summary::months_in_calendar_order;

pub const REPORT_SUBJECT: &str = "Your Monthly Transaction Summary";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct ReportDispatcher {
    channel: Arc<dyn DeliveryChannel>,
}

impl ReportDispatcher {
    pub fn new(channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { channel }
    }

    /// Sends the report once. Any channel failure becomes `DeliveryFailed`.
    pub async fn dispatch(&self, destination: &str, summary: &Summary) -> CoreResult<MessageId> {
        let report = render_report(summary);
        let message_id = self
            .channel
            .send(destination, &report.subject, &report.html)
            .await
            .map_err(|e| {
                error!(email = %destination, "Error sending summary email: {}", e);
                CoreError::DeliveryFailed(e.to_string())
            })?;

        info!(email = %destination, message_id = %message_id.0, "Summary email sent");
        Ok(message_id)
    }
}

pub fn render_report(summary: &Summary) -> RenderedReport {
    let mut months = String::new();
    for (month, count) in months_in_calendar_order(&summary.transactions_by_month) {
        let _ = write!(
            months,
            "<li class=\"transaction-item\"><strong>{month}:</strong> {count} transactions</li>"
        );
    }

    let html = format!(
        "<html><body><div class=\"container\">\
         <h1>Transaction Summary</h1>\
         <p>Activity from {start} to {end}</p>\
         <div class=\"balance\"><strong>Total Balance</strong><br>${balance:.2}</div>\
         <h3>Transactions by Month</h3>\
         <ul class=\"transactions-list\">{months}</ul>\
         <div class=\"averages\">\
         <div class=\"average-box\"><h4>Average Debits</h4><span class=\"debit\">${debit:.2}</span></div>\
         <div class=\"average-box\"><h4>Average Credits</h4><span class=\"credit\">${credit:.2}</span></div>\
         </div>\
         <p class=\"footer\">This is an automated message. Please do not reply to this email.</p>\
         </div></body></html>",
        start = summary.window.start,
        end = summary.window.end,
        balance = summary.total_balance,
        debit = summary.avg_debit.abs(),
        credit = summary.avg_credit,
    );

    RenderedReport {
        subject: REPORT_SUBJECT.to_string(),
        html,
    }
}
