//! # Publish Orchestration
//!
//! [`EventFabric`] is the explicit context object for the fabric: built
//! once at process start and handed (or injected) to every component
//! that publishes or subscribes. No module-level singletons, so lifecycle
//! (start, shutdown, test isolation) stays visible and testable.
//!
//! ## Ordering contract
//!
//! `publish` runs three tiers in order, each independent of the previous
//! tier's success:
//!
//! 1. replay-log append: failure logged and swallowed;
//! 2. transport publish (only in `Connected` state, bounded by
//!    `publish_timeout`): on success local subscribers are reached
//!    through the relay, so tier 3 is skipped to avoid double delivery;
//! 3. local emit: when the transport is disabled, not yet connected, or
//!    tier 2 failed.
//!
//! Each tier's outcome is an explicit `Result` matched here; the
//! fallback is a visible branch, not a swallowed catch.

use crate::adapters::NoopReplay;
use crate::emitter::{LocalEmitter, Subscription};
use crate::ports::{ReplaySink, Transport};
use crate::relay::{self, RelayCounters};
use crate::DEFAULT_PUBLISH_TIMEOUT_MS;
use shared_types::{Channel, FabricEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Fabric tuning knobs.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    /// Upper bound on one transport publish call; on expiry the call is
    /// treated as failed and delivery falls back to the local emitter.
    pub publish_timeout: Duration,
    /// First connect retry delay; doubles per attempt.
    pub connect_backoff_base: Duration,
    /// Ceiling for the connect retry delay.
    pub connect_backoff_cap: Duration,
    /// Connect attempts before giving up and staying local-only.
    pub connect_max_attempts: u32,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_millis(DEFAULT_PUBLISH_TIMEOUT_MS),
            connect_backoff_base: Duration::from_millis(250),
            connect_backoff_cap: Duration::from_secs(8),
            connect_max_attempts: 6,
        }
    }
}

/// Transport lifecycle, as an explicit variant rather than a nullable
/// handle: "absent", "not yet ready", and "ready" are three different
/// facts and publishers branch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No transport configured. Local-only is a first-class mode, not a
    /// degraded one.
    Disabled,
    /// Transport configured, background connect still in flight (or
    /// permanently failed). Publishes take the local path.
    Connecting,
    /// Transport connected and relays running.
    Connected,
}

/// Process-wide event fabric: local fan-out plus optional distributed
/// transport and best-effort replay log.
pub struct EventFabric {
    emitter: Arc<LocalEmitter>,
    transport: Option<Arc<dyn Transport>>,
    replay: Arc<dyn ReplaySink>,
    config: FabricConfig,
    state_tx: watch::Sender<TransportState>,
    state_rx: watch::Receiver<TransportState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: AtomicBool,
    counters: Arc<RelayCounters>,
}

impl EventFabric {
    /// Build a fabric.
    ///
    /// `transport = None` selects local-only mode. With a transport, the
    /// fabric starts in [`TransportState::Connecting`] and stays there
    /// until [`EventFabric::start`]'s background task connects.
    #[must_use]
    pub fn new(
        config: FabricConfig,
        transport: Option<Arc<dyn Transport>>,
        replay: Arc<dyn ReplaySink>,
    ) -> Arc<Self> {
        let initial = if transport.is_some() {
            TransportState::Connecting
        } else {
            TransportState::Disabled
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Arc::new(Self {
            emitter: LocalEmitter::new(),
            transport,
            replay,
            config,
            state_tx,
            state_rx,
            shutdown_tx,
            shutdown_rx,
            started: AtomicBool::new(false),
            counters: Arc::new(RelayCounters::default()),
        })
    }

    /// Build a local-only fabric with no replay log.
    #[must_use]
    pub fn local_only(config: FabricConfig) -> Arc<Self> {
        Self::new(config, None, Arc::new(NoopReplay))
    }

    /// Schedule the background connect task. Idempotent, never blocks:
    /// a publish issued before the connection completes falls back to
    /// local-only delivery for that call.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(transport) = self.transport.clone() else {
            debug!("no transport configured, fabric running local-only");
            return;
        };

        let fabric = Arc::clone(self);
        tokio::spawn(async move {
            let mut delay = fabric.config.connect_backoff_base;
            for attempt in 1..=fabric.config.connect_max_attempts {
                match transport.connect().await {
                    Ok(()) => {
                        fabric.spawn_relays(&transport).await;
                        // Flip to Connected only after the relays are
                        // subscribed, otherwise a publish routed to the
                        // transport could race past same-process
                        // subscribers.
                        let _ = fabric.state_tx.send(TransportState::Connected);
                        info!("transport connected, cross-process delivery active");
                        return;
                    }
                    Err(err) => {
                        warn!(attempt, error = %err, "transport connect failed");
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(fabric.config.connect_backoff_cap);
                    }
                }
            }
            warn!(
                attempts = fabric.config.connect_max_attempts,
                "transport unreachable, continuing in local-only mode"
            );
        });
    }

    async fn spawn_relays(&self, transport: &Arc<dyn Transport>) {
        for channel in Channel::ALL {
            match transport.subscribe(channel.topic()).await {
                Ok(rx) => {
                    tokio::spawn(relay::run(
                        channel,
                        rx,
                        Arc::clone(&self.emitter),
                        Arc::clone(&self.counters),
                        self.shutdown_rx.clone(),
                    ));
                }
                Err(err) => {
                    warn!(
                        topic = channel.topic(),
                        error = %err,
                        "relay subscribe failed, channel is local-only"
                    );
                }
            }
        }
    }

    /// Publish one event. Never fails: every internal error is recovered
    /// by the next delivery tier, and the call resolves once local
    /// delivery (direct or via the transport relay) has been attempted.
    pub async fn publish(&self, event: FabricEvent) {
        let channel = event.channel();
        let topic = channel.topic();

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                // Unreachable for the closed envelope union, but the
                // ladder stays explicit.
                warn!(topic, error = %err, "envelope serialization failed, dropping event");
                return;
            }
        };

        // Tier 1: replay append, best-effort.
        if let Err(err) = self.replay.append(topic, &payload).await {
            warn!(topic, error = %err, "replay append failed, continuing");
        }

        // Tier 2: transport publish, only when connected. State is
        // copied out first so no watch guard is held across the await.
        let state = *self.state_rx.borrow();
        let remote_delivered = match (state, &self.transport) {
            (TransportState::Connected, Some(transport)) => {
                match tokio::time::timeout(
                    self.config.publish_timeout,
                    transport.publish(topic, &payload),
                )
                .await
                {
                    Ok(Ok(())) => true,
                    Ok(Err(err)) => {
                        warn!(topic, error = %err, "transport publish failed, delivering locally");
                        false
                    }
                    Err(_) => {
                        warn!(topic, "transport publish timed out, delivering locally");
                        false
                    }
                }
            }
            _ => false,
        };

        // Tier 3: local emit, unless the transport already carried the
        // event (same-process subscribers then hear it via the relay).
        if !remote_delivered {
            self.emitter.emit(channel, &event);
        }
    }

    /// Register `handler` for `channel`. Subscribers never talk to the
    /// transport; the relay feeds them through the same local emitter.
    pub fn subscribe<F>(&self, channel: Channel, handler: F) -> Subscription
    where
        F: Fn(&FabricEvent) + Send + Sync + 'static,
    {
        self.emitter.subscribe(channel, handler)
    }

    /// Current transport lifecycle state.
    #[must_use]
    pub fn transport_state(&self) -> TransportState {
        *self.state_rx.borrow()
    }

    /// Wait until the fabric reaches `target` state. Returns early if
    /// the fabric is dropped.
    pub async fn wait_for_state(&self, target: TransportState) {
        let mut rx = self.state_rx.clone();
        loop {
            if *rx.borrow_and_update() == target {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Relay activity counters for this fabric.
    #[must_use]
    pub fn relay_counters(&self) -> &RelayCounters {
        &self.counters
    }

    /// Handlers currently registered for `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.emitter.subscriber_count(channel)
    }

    /// Stop the relay tasks. Local delivery keeps working; intended for
    /// graceful shutdown and test teardown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
