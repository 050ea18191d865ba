//! crates/ledger_digest_core/src/upload.rs
//!
//! Accepts a transaction statement from an authenticated user: its parsed rows
//! go to the transaction sink, then the raw file goes to the blob store. A
//! failed ingest stores nothing.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{SessionRecord, UploadReceipt};
use crate::error::{CoreError, CoreResult};
use crate::ports::{BlobStore, CredentialStore, TransactionSink};
use crate::statement::parse_statement;

#[derive(Clone)]
pub struct UploadService {
    credentials: Arc<dyn CredentialStore>,
    blobs: Arc<dyn BlobStore>,
    sink: Arc<dyn TransactionSink>,
}

impl UploadService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        blobs: Arc<dyn BlobStore>,
        sink: Arc<dyn TransactionSink>,
    ) -> Self {
        Self {
            credentials,
            blobs,
            sink,
        }
    }

    /// Stores and ingests a statement for the owner of an already verified session.
    pub async fn upload(
        &self,
        session: &SessionRecord,
        file_name: &str,
        folder: Option<&str>,
        body: Bytes,
    ) -> CoreResult<UploadReceipt> {
        let key = object_key(file_name, folder)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(CoreError::InvalidInput("File is empty".to_string()));
        }
        let text = std::str::from_utf8(&body)
            .map_err(|e| CoreError::InvalidInput(format!("File is not valid UTF-8: {e}")))?;

        let identity = self
            .credentials
            .find_by_email(&session.owner_email)
            .await?
            .ok_or_else(|| {
                error!(email = %session.owner_email, "Upload for a token with no matching identity");
                CoreError::AccountNotFound {
                    email: session.owner_email.clone(),
                }
            })?;

        let parsed = parse_statement(identity.id, text);
        for rejected in &parsed.rejected {
            warn!(key = %key, line = rejected.line, reason = %rejected.reason, "Skipping statement line");
        }

        if !parsed.records.is_empty() {
            self.sink.insert_batch(&parsed.records).await?;
        }
        if let Err(e) = self.blobs.put_object(&key, body).await {
            error!(
                user_id = %identity.id,
                key = %key,
                ingested = parsed.records.len(),
                "Rows ingested but raw statement not stored: {}", e
            );
            return Err(e.into());
        }

        info!(
            user_id = %identity.id,
            key = %key,
            accepted = parsed.records.len(),
            rejected = parsed.rejected.len(),
            "Statement uploaded"
        );
        Ok(UploadReceipt {
            key,
            accepted: parsed.records.len(),
            rejected: parsed.rejected.len(),
        })
    }
}

/// `folder/file_name`, refusing anything that could escape the bucket root.
pub fn object_key(file_name: &str, folder: Option<&str>) -> CoreResult<String> {
    let file_name = file_name.trim();
    if !is_safe_segment(file_name) {
        return Err(CoreError::InvalidInput(format!("Invalid file name '{file_name}'")));
    }

    match folder.map(|f| f.trim().trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => {
            if !folder.split('/').all(is_safe_segment) {
                return Err(CoreError::InvalidInput(format!("Invalid folder '{folder}'")));
            }
            Ok(format!("{folder}/{file_name}"))
        }
        None => Ok(file_name.to_string()),
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
