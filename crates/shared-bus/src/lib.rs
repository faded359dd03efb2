//! # Shared Bus: Tiered Event Notification Fabric
//!
//! Delivers state-change events ("AI scores updated", "MSRP changed") to
//! interested listeners, in-process or across processes when a
//! distributed transport is configured.
//!
//! ## Delivery Tiers
//!
//! ```text
//! publish(event)
//!     │
//!     ├─ 1. replay log append ── best-effort, failure swallowed
//!     │
//!     ├─ 2. transport publish ── only when Connected; on failure or
//!     │         │                timeout fall through to tier 3
//!     │         ▼
//!     │    [broker] ──→ relay task ──→ LocalEmitter (this process
//!     │                                 and every peer process)
//!     │
//!     └─ 3. LocalEmitter ─────── when no transport, not yet connected,
//!                                 or tier 2 failed
//! ```
//!
//! When tier 2 succeeds, tier 3 is skipped: same-process subscribers
//! receive the event through the relay, never twice.
//!
//! ## Guarantees and Limits
//!
//! - **FIFO per publishing process per channel** on the local path: tier 3
//!   is synchronous, so two publishes with no intervening await are
//!   observed in order by a subscriber registered before both.
//! - **No cross-process ordering.** The transport is a plain Pub/Sub
//!   primitive with no sequencing; messages from different publishers may
//!   interleave arbitrarily at a given subscriber.
//! - **At-most-once per registration**, best-effort. No retry, no ack, no
//!   redelivery of a lost message.
//! - Handlers are fire-and-forget from the emitter's perspective: the
//!   emitter never awaits a handler, so a slow subscriber cannot throttle
//!   publishers. A handler needing async work spawns its own task.

pub mod adapters;
pub mod emitter;
pub mod fabric;
pub mod ports;
pub mod relay;

pub use emitter::{LocalEmitter, Subscription};
pub use fabric::{EventFabric, FabricConfig, TransportState};
pub use ports::{ReplayError, ReplaySink, Transport, TransportError};
pub use relay::RelayCounters;

/// Upper bound on a single transport publish call before the fabric
/// treats it as failed and falls back to local delivery.
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 2_000;

/// Buffered messages per relay subscription before the bridge drops the
/// oldest.
pub const RELAY_CHANNEL_CAPACITY: usize = 256;
