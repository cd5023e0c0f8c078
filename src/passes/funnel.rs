//! Detects split-then-reconverge diamond topologies.

use crate::config::AnalyzerConfig;
use crate::graph::TransactionGraph;
use crate::model::{PatternType, Role};
use crate::registry::{RingRegistry, SuspicionRegistry};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use tracing::debug;

/// Whether the pass hit `MAX_CONSOL` and stopped emitting early.
pub struct FunnelOutcome {
    pub truncated: bool,
}

/// Detect "diamond" topologies: a hub distributing to ≥ 3 mules that
/// all remit to a common collector distinct from the hub. Hubs that
/// are themselves cycle members register as `consolidation` instead
/// of `funnel`.
pub fn run(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
) -> FunnelOutcome {
    let mut truncated = false;

    for hub in graph.accounts_sorted() {
        if rings.emitted_count(PatternType::Consolidation) + rings.emitted_count(PatternType::Funnel)
            >= config.max_consol
        {
            truncated = true;
            break;
        }
        if graph.out_degree(hub) < 3 {
            continue;
        }

        let successors: HashSet<NodeIndex> = graph.successors(hub);
        if successors.len() < 3 {
            continue;
        }

        let mut co_collectors: std::collections::HashMap<NodeIndex, HashSet<NodeIndex>> =
            std::collections::HashMap::new();
        for &mule in &successors {
            for target in graph.successors(mule) {
                if target != hub {
                    co_collectors.entry(target).or_default().insert(mule);
                }
            }
        }

        let mut collectors: Vec<NodeIndex> = co_collectors.keys().copied().collect();
        collectors.sort_by_key(|&idx| graph.account_id(idx).to_string());

        for collector in collectors {
            let mules = &co_collectors[&collector];
            if mules.len() < config.funnel_min_mules {
                continue;
            }
            if rings.emitted_count(PatternType::Consolidation) + rings.emitted_count(PatternType::Funnel)
                >= config.max_consol
            {
                truncated = true;
                break;
            }

            let hub_id = graph.account_id(hub).to_string();
            let collector_id = graph.account_id(collector).to_string();
            let mut mule_ids: Vec<String> =
                mules.iter().map(|&idx| graph.account_id(idx).to_string()).collect();
            mule_ids.sort();

            let pattern_type = if rings.cycle_members().contains(&hub_id) {
                PatternType::Consolidation
            } else {
                PatternType::Funnel
            };

            let mut members = mule_ids.clone();
            members.push(hub_id.clone());
            members.push(collector_id.clone());
            members.sort();
            members.dedup();

            let score = 94.0_f64.min(config.score_cap);
            let tag = pattern_type.to_string();
            let ring_id = rings.register(pattern_type, members, score, Vec::new(), None, graph);

            suspects.update(&hub_id, score, &tag, &ring_id, Role::Source, false);
            suspects.update(&collector_id, score, &tag, &ring_id, Role::Collector, false);
            for mule in &mule_ids {
                suspects.update(mule, score, &tag, &ring_id, Role::Layer, false);
            }
        }
    }

    debug!(truncated, "funnel pass complete");
    FunnelOutcome { truncated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergePolicy;
    use crate::model::Transaction;
    use chrono::{TimeZone, Utc};

    fn txn(id: &str, from: &str, to: &str, hour: i64) -> Transaction {
        Transaction {
            txn_id: id.to_string(),
            sender: from.to_string(),
            receiver: to.to_string(),
            amount: 500.0,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour),
        }
    }

    #[test]
    fn diamond_funnel_scores_94() {
        let txns = vec![
            txn("T1", "H", "m1", 0),
            txn("T2", "H", "m2", 1),
            txn("T3", "H", "m3", 2),
            txn("T4", "H", "m4", 3),
            txn("T5", "m1", "T", 4),
            txn("T6", "m2", "T", 5),
            txn("T7", "m3", "T", 6),
            txn("T8", "m4", "T", 7),
        ];
        let graph = TransactionGraph::build(&txns).unwrap();
        let config = AnalyzerConfig::default();
        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(MergePolicy::Max, config.score_cap);

        run(&graph, &config, &mut rings, &mut suspects);

        assert_eq!(rings.rings().len(), 1);
        let ring = &rings.rings()[0];
        assert_eq!(ring.pattern_type, PatternType::Funnel);
        assert_eq!(ring.risk_score, 94.0);
        assert_eq!(ring.member_accounts.len(), 6);

        let accounts = suspects.into_sorted_vec();
        assert_eq!(accounts.iter().find(|a| a.account_id == "H").unwrap().role, Role::Source);
        assert_eq!(accounts.iter().find(|a| a.account_id == "T").unwrap().role, Role::Collector);
    }

    #[test]
    fn fewer_than_three_co_mules_is_not_a_ring() {
        let txns = vec![
            txn("T1", "H", "m1", 0),
            txn("T2", "H", "m2", 1),
            txn("T3", "H", "m3", 2),
            txn("T4", "m1", "T", 3),
            txn("T5", "m2", "T", 4),
        ];
        let graph = TransactionGraph::build(&txns).unwrap();
        let config = AnalyzerConfig::default();
        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(MergePolicy::Max, config.score_cap);
        run(&graph, &config, &mut rings, &mut suspects);
        assert!(rings.rings().is_empty());
    }
}
