//! Auto-fix gate: turns consensus classifications into remediation
//! decisions.

use crate::domain::{
    AutoFixCandidate, AutoFixPartition, ConsensusLevel, ConsensusResult, IssueHit, Severity,
};
use crate::evaluator::evaluate_consensus;
use shared_types::ValidationError;

/// Partition every distinct issue in `hits` into exactly one bucket:
/// unanimous consensus may auto-fix, majority goes to the review queue,
/// weak is logged only.
///
/// Pure decision: nothing is executed, queued, or written here.
pub fn partition_for_auto_fix(
    hits: &[IssueHit],
    total_engines: usize,
) -> Result<AutoFixPartition, ValidationError> {
    let results = evaluate_consensus(hits, total_engines)?;

    let mut partition = AutoFixPartition::default();
    for result in results {
        let candidate = candidate_from(hits, result);
        match candidate.consensus {
            ConsensusLevel::Unanimous => partition.auto_fix.push(candidate),
            ConsensusLevel::Majority => partition.review_queue.push(candidate),
            ConsensusLevel::Weak => partition.logged.push(candidate),
        }
    }
    Ok(partition)
}

/// Whether `issue_id`'s consensus over the current hit set is unanimous.
///
/// Pure function of `hits`; independent of any prior
/// [`partition_for_auto_fix`] call, so callers can re-check one issue
/// ad hoc as hits arrive incrementally. An id absent from the batch is
/// simply not unanimous.
pub fn can_auto_fix(
    hits: &[IssueHit],
    issue_id: &str,
    total_engines: usize,
) -> Result<bool, ValidationError> {
    let results = evaluate_consensus(hits, total_engines)?;
    Ok(results
        .iter()
        .any(|r| r.id == issue_id && r.unanimous))
}

fn candidate_from(hits: &[IssueHit], result: ConsensusResult) -> AutoFixCandidate {
    // Worst severity reported for this issue; engines that stay silent
    // on severity count as Medium.
    let severity = hits
        .iter()
        .filter(|h| h.id == result.id)
        .map(|h| h.severity.unwrap_or_default())
        .max()
        .unwrap_or_default();

    let consensus = result.level();
    AutoFixCandidate {
        issue_id: result.id,
        severity,
        engines: result.engines,
        consensus,
        requires_approval: consensus != ConsensusLevel::Unanimous,
    }
}
