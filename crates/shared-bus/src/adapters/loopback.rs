//! # Loopback Transport
//!
//! In-process broker: one broadcast ring per topic. Two fabrics sharing
//! one `LoopbackTransport` behave like two processes sharing a broker,
//! which is exactly how the integration suite exercises cross-process
//! delivery. A fault switch lets tests force publish failures to drive
//! the local-delivery fallback.

use crate::ports::{Transport, TransportError};
use crate::RELAY_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// In-memory Pub/Sub broker.
pub struct LoopbackTransport {
    topics: Mutex<HashMap<String, broadcast::Sender<String>>>,
    fail_publishes: AtomicBool,
    fail_connect: AtomicBool,
}

impl LoopbackTransport {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            fail_publishes: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
        }
    }

    /// Force every subsequent publish to fail (fault injection).
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Force every subsequent connect to fail (fault injection).
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Inject a raw payload on `topic`, bypassing `publish`.
    ///
    /// Lets tests deliver malformed cross-process payloads to the relay
    /// the way a misbehaving peer would.
    pub fn inject_raw(&self, topic: &str, payload: &str) {
        let tx = self.sender_for(topic);
        let _ = tx.send(payload.to_string());
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<String> {
        let mut topics = self.topics.lock();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(RELAY_CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("injected connect failure".into()));
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(TransportError::Publish("injected publish failure".into()));
        }
        // A broker accepts a publish even with zero consumers; the send
        // error for an empty ring is not a failure.
        let _ = self.sender_for(topic).send(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>, TransportError> {
        let mut ring = self.sender_for(topic).subscribe();
        let (tx, rx) = mpsc::channel(RELAY_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                match ring.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break; // subscriber side dropped
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "loopback subscriber lagged, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(rx)
    }
}
