//! # Outbound Ports
//!
//! The fabric's two external collaborators, behind traits so the broker
//! and the durable log stay black boxes. The crate ships in-memory
//! adapters (see [`crate::adapters`]); a process embedding a real broker
//! client implements [`Transport`] against it.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport-side failures. All of them are recovered by falling back to
/// local delivery; none reach a publisher as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the broker.
    #[error("transport connect failed: {0}")]
    Connect(String),

    /// A publish was rejected or lost before the broker accepted it.
    #[error("transport publish failed: {0}")]
    Publish(String),

    /// A subscription could not be established.
    #[error("transport subscribe failed: {0}")]
    Subscribe(String),

    /// The connection is gone.
    #[error("transport connection closed")]
    Closed,
}

/// Replay-log failures. Swallowed by the publish orchestration: replay
/// is an enhancement, not a delivery guarantee.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// The underlying sink failed to append.
    #[error("replay append failed: {0}")]
    Append(String),
}

/// Distributed Pub/Sub bridge.
///
/// When configured, the fabric publishes serialized envelopes here and
/// subscribes once per known topic at start, re-injecting received
/// messages into the local emitter. Connectivity loss is non-fatal: the
/// fabric keeps operating in local-only mode.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the broker connection. Called once, off the caller's
    /// path, by the fabric's background connect task.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Publish one serialized payload to `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Subscribe to `topic`. The returned receiver yields raw payloads
    /// until the transport closes.
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>, TransportError>;
}

/// Append-only replay stream, keyed by topic.
///
/// Best-effort durable record of every published payload for later
/// audit/replay. No read API: replay consumption is external.
#[async_trait]
pub trait ReplaySink: Send + Sync {
    /// Append one payload under `topic`.
    async fn append(&self, topic: &str, payload: &str) -> Result<(), ReplayError>;
}
