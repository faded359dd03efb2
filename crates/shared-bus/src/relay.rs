//! # Inbound Relay
//!
//! One task per known topic bridges the transport's receive side into
//! the local emitter, so subscribers never talk to the transport
//! directly. A payload that does not deserialize to the topic's envelope
//! is dropped with a warning; a malformed cross-process message must not
//! crash the receiving process, and there is no way to request
//! redelivery of a lost Pub/Sub message.

use crate::emitter::LocalEmitter;
use shared_types::{Channel, FabricEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Relay activity counters, shared across all relay tasks of one fabric.
#[derive(Debug, Default)]
pub struct RelayCounters {
    relayed: AtomicU64,
    dropped_malformed: AtomicU64,
}

impl RelayCounters {
    /// Events re-injected into the local emitter.
    pub fn relayed(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }

    /// Inbound payloads dropped as malformed.
    pub fn dropped_malformed(&self) -> u64 {
        self.dropped_malformed.load(Ordering::Relaxed)
    }
}

/// Consume `rx` until the transport closes or shutdown is signalled,
/// re-injecting each well-formed envelope into `emitter` as if it had
/// been emitted locally.
pub(crate) async fn run(
    channel: Channel,
    mut rx: mpsc::Receiver<String>,
    emitter: Arc<LocalEmitter>,
    counters: Arc<RelayCounters>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!(channel = %channel, "relay stopping on shutdown");
                break;
            }
            msg = rx.recv() => match msg {
                None => {
                    // Transport closed; local-only operation continues.
                    debug!(channel = %channel, "transport stream closed, relay ending");
                    break;
                }
                Some(raw) => match serde_json::from_str::<FabricEvent>(&raw) {
                    Ok(event) if event.channel() == channel => {
                        counters.relayed.fetch_add(1, Ordering::Relaxed);
                        emitter.emit(channel, &event);
                    }
                    Ok(event) => {
                        counters.dropped_malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            topic = channel.topic(),
                            got = event.event_type(),
                            "envelope kind does not match topic, dropping"
                        );
                    }
                    Err(err) => {
                        counters.dropped_malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            topic = channel.topic(),
                            error = %err,
                            "undecodable payload from transport, dropping"
                        );
                    }
                },
            }
        }
    }
}
