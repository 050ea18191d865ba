//! services/api/src/adapters/mailer.rs
//!
//! Delivery channels for summary reports. `HttpMailChannel` posts to a
//! transactional-mail HTTP API; `LogMailChannel` only logs, for local runs.

use async_trait::async_trait;
use ledger_digest_core::domain::MessageId;
use ledger_digest_core::ports::{DeliveryChannel, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

//=========================================================================================
// HTTP Mail API
//=========================================================================================

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    #[serde(alias = "message_id", alias = "MessageId")]
    id: String,
}

#[derive(Clone)]
pub struct HttpMailChannel {
    client: Client,
    endpoint: String,
    api_key: String,
    sender: String,
}

impl HttpMailChannel {
    pub fn new(endpoint: String, api_key: String, sender: String) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build mail client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            sender,
        })
    }
}

#[async_trait]
impl DeliveryChannel for HttpMailChannel {
    async fn send(
        &self,
        destination: &str,
        subject: &str,
        html_body: &str,
    ) -> PortResult<MessageId> {
        let request = SendEmailRequest {
            from: &self.sender,
            to: [destination],
            subject,
            html: html_body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PortError::Unavailable(e.to_string())
                } else {
                    PortError::Unexpected(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                PortError::Unavailable(format!("Mail API returned {status}: {body}"))
            } else {
                PortError::Unexpected(format!("Mail API returned {status}: {body}"))
            });
        }

        let parsed: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Unreadable mail API response: {e}")))?;
        Ok(MessageId(parsed.id))
    }
}

//=========================================================================================
// Log-only Channel
//=========================================================================================

#[derive(Clone, Default)]
pub struct LogMailChannel;

#[async_trait]
impl DeliveryChannel for LogMailChannel {
    async fn send(
        &self,
        destination: &str,
        subject: &str,
        html_body: &str,
    ) -> PortResult<MessageId> {
        let id = format!("local-{}", Uuid::new_v4());
        info!(
            email = %destination,
            subject = %subject,
            bytes = html_body.len(),
            message_id = %id,
            "Mail delivery not configured; report logged instead of sent"
        );
        Ok(MessageId(id))
    }
}
