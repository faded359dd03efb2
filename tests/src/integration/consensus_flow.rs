//! Detection pipeline flow: per-engine issue reports arriving over time,
//! scored for agreement, then gated into remediation buckets.

#[cfg(test)]
mod tests {
    use consensus_gate::{
        can_auto_fix, evaluate_consensus, partition_for_auto_fix, ConsensusLevel, IssueHit,
        Severity,
    };
    use shared_types::ValidationError;

    const TOTAL_ENGINES: usize = 3; // seo, aeo, geo

    fn hit(id: &str, engine: &str) -> IssueHit {
        IssueHit::new(id, engine)
    }

    #[test]
    fn test_full_pipeline_from_hits_to_buckets() {
        let hits = vec![
            // Every engine flags the missing schema markup.
            hit("missing-schema", "seo").with_severity(Severity::High),
            hit("missing-schema", "aeo").with_severity(Severity::Medium),
            hit("missing-schema", "geo").with_severity(Severity::High),
            // Two engines flag the stale inventory feed.
            hit("stale-feed", "seo"),
            hit("stale-feed", "geo").with_weight(0.5),
            // A single engine flags the description length.
            hit("thin-description", "aeo").with_severity(Severity::Low),
        ];

        let results = evaluate_consensus(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].level(), ConsensusLevel::Unanimous);
        assert_eq!(results[1].level(), ConsensusLevel::Majority);
        assert_eq!(results[2].level(), ConsensusLevel::Weak);
        assert!((results[1].weight - 1.5).abs() < f64::EPSILON);

        let partition = partition_for_auto_fix(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(partition.auto_fix.len(), 1);
        assert_eq!(partition.review_queue.len(), 1);
        assert_eq!(partition.logged.len(), 1);

        let fix = &partition.auto_fix[0];
        assert_eq!(fix.issue_id, "missing-schema");
        assert_eq!(fix.severity, Severity::High);
        assert!(!fix.requires_approval);

        let review = &partition.review_queue[0];
        assert_eq!(review.issue_id, "stale-feed");
        assert!(review.requires_approval);
    }

    #[test]
    fn test_incremental_hits_promote_an_issue() {
        // Consensus is emergent: the same issue moves buckets as more
        // engines report, with no state carried between passes.
        let mut hits = vec![hit("missing-schema", "seo")];
        let pass1 = partition_for_auto_fix(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(pass1.logged.len(), 1);
        assert!(!can_auto_fix(&hits, "missing-schema", TOTAL_ENGINES).unwrap());

        hits.push(hit("missing-schema", "aeo"));
        let pass2 = partition_for_auto_fix(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(pass2.review_queue.len(), 1);

        hits.push(hit("missing-schema", "geo"));
        let pass3 = partition_for_auto_fix(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(pass3.auto_fix.len(), 1);
        assert!(can_auto_fix(&hits, "missing-schema", TOTAL_ENGINES).unwrap());
    }

    #[test]
    fn test_duplicate_engine_reports_do_not_fake_consensus() {
        // One noisy engine reporting three times is still one engine.
        let hits = vec![
            hit("missing-schema", "seo"),
            hit("missing-schema", "seo"),
            hit("missing-schema", "seo"),
        ];
        let results = evaluate_consensus(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(results[0].engines, vec!["seo"]);
        assert_eq!(results[0].level(), ConsensusLevel::Weak);
        assert!(!can_auto_fix(&hits, "missing-schema", TOTAL_ENGINES).unwrap());
    }

    #[test]
    fn test_invalid_hit_rejects_the_whole_batch() {
        let hits = vec![hit("missing-schema", "seo"), hit("stale-feed", "")];
        let err = evaluate_consensus(&hits, TOTAL_ENGINES).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyEngine { index: 1, .. }));

        // The gate refuses the same batch rather than partially gating.
        assert!(partition_for_auto_fix(&hits, TOTAL_ENGINES).is_err());
    }

    #[test]
    fn test_every_issue_lands_in_exactly_one_bucket() {
        let hits: Vec<IssueHit> = (0..10)
            .flat_map(|n| {
                let id = format!("issue-{n}");
                ["seo", "aeo", "geo"]
                    .into_iter()
                    .take(n % 3 + 1)
                    .map(move |engine| hit(id.as_str(), engine))
                    .collect::<Vec<_>>()
            })
            .collect();

        let partition = partition_for_auto_fix(&hits, TOTAL_ENGINES).unwrap();
        assert_eq!(partition.len(), 10);

        let mut ids: Vec<&str> = partition
            .auto_fix
            .iter()
            .chain(&partition.review_queue)
            .chain(&partition.logged)
            .map(|c| c.issue_id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}
