//! # Shared Types: Envelopes and Channel Registry
//!
//! Single Source of Truth for the event payload shapes and topic naming
//! used across the fabric.
//!
//! ## Design Rules
//!
//! - A channel key resolves to exactly one physical topic string and
//!   exactly one envelope shape; the binding is static. Adding a channel
//!   is a code change (a new [`Channel`] variant), not configuration, so
//!   subscribers stay compiled against the [`FabricEvent`] union.
//! - Every envelope carries its own `ts`. The fabric never stamps time on
//!   the caller's behalf; callers own time-of-record semantics, which
//!   matters because the replay log and the distributed transport can
//!   both introduce delivery delay.

pub mod channel;
pub mod errors;
pub mod events;

pub use channel::Channel;
pub use errors::ValidationError;
pub use events::{AiScoreUpdate, FabricEvent, MsrpChange};
