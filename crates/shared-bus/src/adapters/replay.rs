//! # Replay Sinks
//!
//! File-backed JSON-lines appender, plus the no-op sink used when no
//! durable-log endpoint is configured (a first-class mode, not an error).

use crate::ports::{ReplayError, ReplaySink};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only JSON-lines file, one record per published payload:
/// `{"topic": "...", "payload": "..."}`.
pub struct JsonlReplay {
    path: PathBuf,
    // Serializes appends so concurrent publishers cannot interleave
    // partial lines.
    write_lock: Mutex<()>,
}

impl JsonlReplay {
    /// Create a sink appending to `path`. The file is created on first
    /// append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The file this sink appends to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ReplaySink for JsonlReplay {
    async fn append(&self, topic: &str, payload: &str) -> Result<(), ReplayError> {
        let line = serde_json::json!({ "topic": topic, "payload": payload }).to_string();

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ReplayError::Append(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ReplayError::Append(e.to_string()))?;
        file.write_all(b"\n")
            .await
            .map_err(|e| ReplayError::Append(e.to_string()))?;
        Ok(())
    }
}

/// Sink used when no durable-log endpoint is configured: every append
/// succeeds and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReplay;

#[async_trait]
impl ReplaySink for NoopReplay {
    async fn append(&self, _topic: &str, _payload: &str) -> Result<(), ReplayError> {
        Ok(())
    }
}
