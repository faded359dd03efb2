//! # consensus-gate
//!
//! Multi-engine agreement scoring and the auto-fix policy built on it.
//!
//! Several independent detection engines (`seo`, `aeo`, `geo`, ...) scan
//! the same records and report issues. A single engine's finding is just
//! a signal; what earns the right to act automatically is *agreement*.
//! This crate turns the raw per-engine findings into a classification:
//!
//! ```text
//! IssueHit batch ──→ evaluate_consensus ──→ ConsensusResult per issue
//!                                               │
//!                         unanimous ────────────┤──→ auto-fix eligible
//!                         majority  ────────────┤──→ human review queue
//!                         weak      ────────────┘──→ log only
//! ```
//!
//! Everything here is a pure decision: no fix is executed, no queue
//! entry written. Callers own the side effects. Classifications are
//! recomputed from the current hit set on every pass; agreement is an
//! emergent property of whichever engines have reported so far, never a
//! stored attribute of an issue.

pub mod domain;
pub mod evaluator;
pub mod gate;

pub use domain::{
    AutoFixCandidate, AutoFixPartition, ConsensusLevel, ConsensusResult, IssueHit, Severity,
};
pub use evaluator::evaluate_consensus;
pub use gate::{can_auto_fix, partition_for_auto_fix};
