//! # Channel Registry
//!
//! Fixed mapping from logical channel key to physical topic string.
//! This module is the single source of truth for topic naming; nothing
//! else in the workspace hardcodes a topic.

use serde::{Deserialize, Serialize};

/// Logical event channels known to the fabric.
///
/// The mapping is closed by design: subscribers are compiled against the
/// [`crate::FabricEvent`] union, so an unknown channel key is a
/// compile-time error rather than a runtime lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// AI visibility score recomputes (`AiScoreUpdate` envelopes).
    Ai,
    /// MSRP price changes (`MsrpChange` envelopes).
    Msrp,
}

impl Channel {
    /// Every channel the fabric knows about.
    ///
    /// The inbound relay subscribes to each of these topics exactly once
    /// at process start.
    pub const ALL: [Channel; 2] = [Channel::Ai, Channel::Msrp];

    /// Logical key, what producers name when publishing.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Ai => "ai",
            Channel::Msrp => "msrp",
        }
    }

    /// Physical topic string, what the transport and replay log key by.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Channel::Ai => "events.ai",
            Channel::Msrp => "events.msrp",
        }
    }

    /// Reverse lookup for the inbound relay.
    #[must_use]
    pub fn from_topic(topic: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.topic() == topic)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
