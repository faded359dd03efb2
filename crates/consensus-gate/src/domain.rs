//! Domain types for consensus scoring and the auto-fix gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One engine's report of one issue. A batch carries one `IssueHit` per
/// (issue, engine) pair; hits sharing an `id` are independent detections
/// of the same logical issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueHit {
    /// Logical issue identifier. Must be non-empty.
    pub id: String,
    /// Reporting engine name (`"seo"`, `"aeo"`, `"geo"`, ...). Must be
    /// non-empty.
    pub engine: String,
    /// Engine-assigned confidence weight; `None` counts as 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Engine-assigned severity; `None` counts as [`Severity::Medium`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl IssueHit {
    #[must_use]
    pub fn new(id: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            engine: engine.into(),
            weight: None,
            severity: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Issue severity as reported by a detection engine. Ordered so the
/// worst report across an issue's hits can be taken with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Agreement classification for one issue. Mutually exclusive and
/// collectively exhaustive over the three levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    /// Every known engine reported the issue.
    Unanimous,
    /// At least half of the known engines (rounded up), short of all.
    Majority,
    /// Fewer than half, or the known-engine population is zero.
    Weak,
}

impl fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unanimous => "unanimous",
            Self::Majority => "majority",
            Self::Weak => "weak",
        };
        f.write_str(s)
    }
}

/// Per-issue output of [`evaluate_consensus`](crate::evaluate_consensus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub id: String,
    /// Distinct reporting engines, first-seen order.
    pub engines: Vec<String>,
    /// Sum of each distinct engine's weight (1.0 when unspecified).
    pub weight: f64,
    pub unanimous: bool,
    pub majority: bool,
    pub weak: bool,
}

impl ConsensusResult {
    /// The one classification flag set on this result.
    #[must_use]
    pub fn level(&self) -> ConsensusLevel {
        if self.unanimous {
            ConsensusLevel::Unanimous
        } else if self.majority {
            ConsensusLevel::Majority
        } else {
            ConsensusLevel::Weak
        }
    }
}

/// A remediation decision for one issue. Derived fresh on every
/// evaluation pass, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoFixCandidate {
    pub issue_id: String,
    /// Worst severity reported across the issue's hits.
    pub severity: Severity,
    pub engines: Vec<String>,
    pub consensus: ConsensusLevel,
    /// Set whenever consensus is short of unanimous.
    pub requires_approval: bool,
}

/// Disjoint buckets produced by
/// [`partition_for_auto_fix`](crate::partition_for_auto_fix); every
/// distinct issue id lands in exactly one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoFixPartition {
    /// Unanimous consensus: safe to remediate without sign-off.
    pub auto_fix: Vec<AutoFixCandidate>,
    /// Majority consensus: queue for human review.
    pub review_queue: Vec<AutoFixCandidate>,
    /// Weak consensus: record only.
    pub logged: Vec<AutoFixCandidate>,
}

impl AutoFixPartition {
    /// Total candidates across all three buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.auto_fix.len() + self.review_queue.len() + self.logged.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
