//! services/api/src/adapters/blob.rs
//!
//! Filesystem-backed implementation of the `BlobStore` port. Object keys map
//! to paths below a root directory.

use async_trait::async_trait;
use bytes::Bytes;
use ledger_digest_core::ports::{BlobStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let relative = Path::new(key);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !clean {
            return Err(PortError::Unexpected(format!("Refusing object key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io_error(e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_object(&self, key: &str, body: Bytes) -> PortResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(map_io_error)?;
        }
        tokio::fs::write(&path, &body).await.map_err(map_io_error)?;
        debug!(path = %path.display(), bytes = body.len(), "Object written");
        Ok(())
    }
}
