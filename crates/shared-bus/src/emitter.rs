//! # Local Fan-Out Emitter
//!
//! Synchronous, in-process, multi-subscriber delivery of one event to
//! zero or more handlers registered against a channel.
//!
//! ## Contract
//!
//! - Handlers run in registration order, on the caller's thread.
//! - Delivery is at-most-once per currently-registered handler: a handler
//!   registered after `emit` returns never sees that event, and one
//!   unsubscribed before `emit` never does either.
//! - A panicking handler is isolated: it is logged and delivery continues
//!   to the remaining handlers in the same `emit` call.
//! - The handler list is snapshotted before any handler runs, so a
//!   handler that unsubscribes itself or registers a new handler during
//!   its own invocation cannot corrupt the in-progress iteration.

use parking_lot::Mutex;
use shared_types::{Channel, FabricEvent};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Boxed subscriber callback.
pub type Handler = dyn Fn(&FabricEvent) + Send + Sync;

struct Registration {
    id: u64,
    handler: Arc<Handler>,
}

/// In-process fan-out registry, one handler list per channel.
#[derive(Default)]
pub struct LocalEmitter {
    registry: Mutex<HashMap<Channel, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl LocalEmitter {
    /// Create an emitter with no registrations.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` for `channel`.
    ///
    /// Returns a [`Subscription`] whose sole capability is removing that
    /// exact registration, either explicitly via
    /// [`Subscription::unsubscribe`] or automatically on drop.
    /// Multiple subscriptions to one channel
    /// are independent and all invoked.
    pub fn subscribe<F>(self: &Arc<Self>, channel: Channel, handler: F) -> Subscription
    where
        F: Fn(&FabricEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .lock()
            .entry(channel)
            .or_default()
            .push(Registration {
                id,
                handler: Arc::new(handler),
            });
        debug!(channel = %channel, id, "subscriber registered");
        Subscription {
            channel,
            id,
            emitter: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every handler currently registered for
    /// `channel`, in registration order. Returns the number of handlers
    /// invoked.
    ///
    /// Synchronous and non-suspending; handlers that perform async work
    /// must hand it off, the emitter never awaits them.
    pub fn emit(&self, channel: Channel, event: &FabricEvent) -> usize {
        // Snapshot under the lock, release before invoking anything:
        // re-entrant subscribe/unsubscribe from inside a handler takes
        // the lock again without deadlocking or corrupting iteration.
        let snapshot: Vec<Arc<Handler>> = {
            let registry = self.registry.lock();
            match registry.get(&channel) {
                Some(entries) => entries.iter().map(|r| Arc::clone(&r.handler)).collect(),
                None => Vec::new(),
            }
        };

        for handler in &snapshot {
            // Failure isolation is per-handler, not per-emit: one
            // panicking handler must not starve the rest.
            if catch_unwind(AssertUnwindSafe(|| (handler.as_ref())(event))).is_err() {
                error!(
                    channel = %channel,
                    event_type = event.event_type(),
                    "subscriber panicked during delivery; continuing with remaining handlers"
                );
            }
        }
        snapshot.len()
    }

    /// Number of handlers currently registered for `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.registry
            .lock()
            .get(&channel)
            .map_or(0, |entries| entries.len())
    }

    fn remove(&self, channel: Channel, id: u64) {
        let mut registry = self.registry.lock();
        if let Some(entries) = registry.get_mut(&channel) {
            entries.retain(|r| r.id != id);
            if entries.is_empty() {
                registry.remove(&channel);
            }
        }
        debug!(channel = %channel, id, "subscriber removed");
    }
}

/// Handle for one registration.
///
/// Removing the registration is this handle's only capability; dropping
/// it unsubscribes, mirroring explicit [`Subscription::unsubscribe`].
pub struct Subscription {
    channel: Channel,
    id: u64,
    emitter: Weak<LocalEmitter>,
}

impl Subscription {
    /// Remove this registration now.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    /// The channel this subscription is registered on.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(emitter) = self.emitter.upgrade() {
            emitter.remove(self.channel, self.id);
        }
    }
}
