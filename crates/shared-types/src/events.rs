//! # Event Envelopes
//!
//! Typed payload shapes for each channel. Pure data, no behavior beyond
//! constructors that keep derived fields consistent.
//!
//! JSON field names stay camelCase (`dealerId`, `deltaPct`) so payloads
//! remain wire-compatible with the upstream producers that already emit
//! them.

use crate::channel::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AI visibility score recompute for one vehicle.
///
/// `avi`/`ati`/`cis` are scores in an application-defined range: producers
/// have been observed emitting both 0–1 and 0–100. The envelope contract
/// does not constrain the range; consumers must not assume normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScoreUpdate {
    /// Vehicle identification number (non-empty).
    pub vin: String,
    /// Dealer the vehicle belongs to, when the producer knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealer_id: Option<String>,
    /// Why the scores were recomputed (e.g. "recompute", "audit").
    pub reason: String,
    /// AI visibility index.
    pub avi: f64,
    /// AI trust index.
    pub ati: f64,
    /// Citation integrity score.
    pub cis: f64,
    /// Caller-stamped time of record.
    pub ts: DateTime<Utc>,
}

/// MSRP change for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsrpChange {
    /// Vehicle identification number.
    pub vin: String,
    /// Previous price; `None` when no prior value exists.
    pub old: Option<f64>,
    /// New price.
    pub new: f64,
    /// Percentage delta; `None` iff `old` is `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_pct: Option<f64>,
    /// Caller-stamped time of record.
    pub ts: DateTime<Utc>,
}

impl MsrpChange {
    /// Build a change record, deriving `delta_pct` from the price pair.
    ///
    /// `delta_pct` is `None` when there is no prior value to diff against;
    /// otherwise `(new - old) / old * 100`. Using this constructor keeps
    /// the pair consistent: callers cannot set a delta that contradicts
    /// the prices.
    #[must_use]
    pub fn from_prices(
        vin: impl Into<String>,
        old: Option<f64>,
        new: f64,
        ts: DateTime<Utc>,
    ) -> Self {
        let delta_pct = old.map(|old| (new - old) / old * 100.0);
        Self {
            vin: vin.into(),
            old,
            new,
            delta_pct,
            ts,
        }
    }
}

/// All events that flow through the fabric, tagged by kind.
///
/// One variant per channel; the binding between variant and channel is
/// static (see [`Channel`]), so subscriber code matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FabricEvent {
    /// AI visibility scores were recomputed.
    AiScoreUpdate(AiScoreUpdate),
    /// A vehicle's MSRP changed.
    MsrpChange(MsrpChange),
}

impl FabricEvent {
    /// The channel this envelope belongs to.
    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            FabricEvent::AiScoreUpdate(_) => Channel::Ai,
            FabricEvent::MsrpChange(_) => Channel::Msrp,
        }
    }

    /// Event kind as a string, for log lines and filtering.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            FabricEvent::AiScoreUpdate(_) => "AiScoreUpdate",
            FabricEvent::MsrpChange(_) => "MsrpChange",
        }
    }

    /// Caller-stamped time of record carried by the envelope.
    #[must_use]
    pub fn ts(&self) -> DateTime<Utc> {
        match self {
            FabricEvent::AiScoreUpdate(e) => e.ts,
            FabricEvent::MsrpChange(e) => e.ts,
        }
    }
}
