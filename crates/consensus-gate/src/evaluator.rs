//! Agreement scoring over a batch of per-engine issue reports.

use crate::domain::{ConsensusResult, IssueHit};
use shared_types::ValidationError;
use tracing::debug;

/// Score a batch of hits: one [`ConsensusResult`] per distinct issue
/// `id`, in first-seen `id` order.
///
/// `total_engines` is the size of the full detection-engine population,
/// supplied by configuration. It is never inferred from the hit set:
/// inferred, "unanimous" would be trivially true whenever a single
/// engine is the only one reporting. `total_engines == 0` classifies
/// every group as weak: no unanimity claim against an undefined
/// population.
///
/// The whole batch is validated before any grouping: a hit with an empty
/// `id` or empty `engine` rejects the batch. Tolerating empties would
/// silently merge unrelated issues under a shared empty key.
pub fn evaluate_consensus(
    hits: &[IssueHit],
    total_engines: usize,
) -> Result<Vec<ConsensusResult>, ValidationError> {
    for (index, hit) in hits.iter().enumerate() {
        if hit.id.is_empty() {
            return Err(ValidationError::EmptyIssueId { index });
        }
        if hit.engine.is_empty() {
            return Err(ValidationError::EmptyEngine {
                index,
                id: hit.id.clone(),
            });
        }
    }

    let mut order: Vec<&str> = Vec::new();
    for hit in hits {
        if !order.contains(&hit.id.as_str()) {
            order.push(&hit.id);
        }
    }

    let mut results = Vec::with_capacity(order.len());
    for id in order {
        let mut engines: Vec<String> = Vec::new();
        let mut weight = 0.0;
        for hit in hits.iter().filter(|h| h.id == id) {
            // An engine reporting twice for the same issue counts once;
            // the first-seen hit's weight wins.
            if !engines.iter().any(|e| e == &hit.engine) {
                engines.push(hit.engine.clone());
                weight += hit.weight.unwrap_or(1.0);
            }
        }

        let agreeing = engines.len();
        let unanimous = total_engines > 0 && agreeing == total_engines;
        let majority = !unanimous && total_engines > 0 && agreeing >= total_engines.div_ceil(2);
        let weak = !unanimous && !majority;

        debug!(id, agreeing, total_engines, weight, "issue classified");
        results.push(ConsensusResult {
            id: id.to_owned(),
            engines,
            weight,
            unanimous,
            majority,
            weak,
        });
    }

    Ok(results)
}
