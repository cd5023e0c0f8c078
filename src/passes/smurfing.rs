//! Detects many-to-one fan-in and one-to-many fan-out smurfing groups.

use crate::config::AnalyzerConfig;
use crate::graph::{EdgeRecord, MerchantIndex, TransactionGraph};
use crate::model::{PatternType, Role};
use crate::registry::{RingRegistry, SuspicionRegistry};
use chrono::{DateTime, Utc};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use tracing::debug;

/// Which side of the transaction the group is pivoted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmurfDirection {
    /// Group by receiver: many senders into one aggregator.
    FanIn,
    /// Group by sender: one hub out to many receivers.
    FanOut,
}

/// Run either the fan-in or fan-out pass over every candidate pivot,
/// in sorted account order for determinism.
pub fn run(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    merchants: &MerchantIndex,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
    direction: SmurfDirection,
) {
    let mut emitted = 0usize;

    for pivot_idx in graph.accounts_sorted() {
        let pivot = graph.account_id(pivot_idx).to_string();
        if merchants.is_merchant(&pivot) {
            continue;
        }

        let raw_edges: Vec<(NodeIndex, &EdgeRecord)> = match direction {
            SmurfDirection::FanIn => graph.in_edges(pivot_idx).collect(),
            SmurfDirection::FanOut => graph.out_edges(pivot_idx).collect(),
        };
        if raw_edges.is_empty() {
            continue;
        }

        let peers = if rings.cycle_members().contains(&pivot) {
            rings.cycle_peers(&pivot)
        } else {
            HashSet::new()
        };

        let filtered: Vec<(String, DateTime<Utc>)> = raw_edges
            .into_iter()
            .filter(|(other_idx, _)| !peers.contains(graph.account_id(*other_idx)))
            .map(|(other_idx, rec)| (graph.account_id(other_idx).to_string(), rec.timestamp))
            .collect();

        let counterparties: HashSet<&str> = filtered.iter().map(|(c, _)| c.as_str()).collect();
        if counterparties.len() < config.smurf_min {
            continue;
        }

        let mut timestamps: Vec<DateTime<Utc>> = filtered.iter().map(|(_, ts)| *ts).collect();
        if !has_dense_window(&mut timestamps, config.smurf_window_hours, config.smurf_min) {
            continue;
        }

        let mut members: Vec<String> = counterparties.into_iter().map(|s| s.to_string()).collect();
        let u_len = members.len();
        members.sort();
        members.push(pivot.clone());
        members.sort();
        members.dedup();

        let pattern_type = match direction {
            SmurfDirection::FanIn => PatternType::SmurfingFanIn,
            SmurfDirection::FanOut => PatternType::SmurfingFanOut,
        };
        let k = match direction {
            SmurfDirection::FanIn => 2.0,
            SmurfDirection::FanOut => 1.5,
        };
        let score = (65.0 + k * u_len as f64).min(97.0).min(config.score_cap);
        let tag = pattern_type.to_string();

        let ring_id = rings.register(pattern_type, members.clone(), score, Vec::new(), None, graph);

        match direction {
            SmurfDirection::FanIn => {
                for member in &members {
                    if member == &pivot {
                        continue;
                    }
                    suspects.update(member, 0.65 * score, &tag, &ring_id, Role::Source, false);
                }
                suspects.update(&pivot, score, &tag, &ring_id, Role::Collector, false);
            }
            SmurfDirection::FanOut => {
                suspects.update(&pivot, score, &tag, &ring_id, Role::Source, false);
                for member in &members {
                    if member == &pivot {
                        continue;
                    }
                    suspects.update(member, 0.70 * score, &tag, &ring_id, Role::Layer, false);
                }
            }
        }
        emitted += 1;
    }

    debug!(emitted, ?direction, "smurfing pass complete");
}

/// True iff a sliding window of width `window_hours` contains at
/// least `min_count` of `timestamps`. Two-pointer scan over a sorted
/// copy: `O(n log n)` sort, `O(n)` scan.
fn has_dense_window(timestamps: &mut [DateTime<Utc>], window_hours: i64, min_count: usize) -> bool {
    timestamps.sort();
    let window = chrono::Duration::hours(window_hours);
    let mut left = 0usize;
    for right in 0..timestamps.len() {
        while timestamps[right] - timestamps[left] > window {
            left += 1;
        }
        if right - left + 1 >= min_count {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergePolicy;
    use crate::model::Transaction;
    use chrono::TimeZone;

    fn txn(id: &str, from: &str, to: &str, amount: f64, hour: i64) -> Transaction {
        Transaction {
            txn_id: id.to_string(),
            sender: from.to_string(),
            receiver: to.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour),
        }
    }

    #[test]
    fn fan_out_of_fourteen_emits_one_ring() {
        let mut txns = Vec::new();
        for i in 0..14 {
            txns.push(txn(&format!("T{i}"), "H", &format!("R{i}"), 495.0, i));
        }
        let graph = TransactionGraph::build(&txns).unwrap();
        let config = AnalyzerConfig::default();
        let merchants = MerchantIndex::classify(&graph, &config);
        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(MergePolicy::Max, config.score_cap);

        run(
            &graph,
            &config,
            &merchants,
            &mut rings,
            &mut suspects,
            SmurfDirection::FanOut,
        );

        assert_eq!(rings.rings().len(), 1);
        let ring = &rings.rings()[0];
        assert_eq!(ring.member_accounts.len(), 15);
        assert_eq!(ring.pattern_type, PatternType::SmurfingFanOut);

        let accounts = suspects.into_sorted_vec();
        let hub = accounts.iter().find(|a| a.account_id == "H").unwrap();
        assert_eq!(hub.role, Role::Source);
        assert!(hub.suspicion_score >= 86.0);
    }

    #[test]
    fn merchant_pivot_is_skipped() {
        let mut txns = Vec::new();
        for i in 0..200 {
            txns.push(txn(&format!("T{i}"), &format!("S{i}"), "M", 10.0, i * 4));
        }
        let graph = TransactionGraph::build(&txns).unwrap();
        let config = AnalyzerConfig::default();
        let merchants = MerchantIndex::classify(&graph, &config);
        assert!(merchants.is_merchant("M"));
        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(MergePolicy::Max, config.score_cap);

        run(
            &graph,
            &config,
            &merchants,
            &mut rings,
            &mut suspects,
            SmurfDirection::FanIn,
        );
        assert!(rings.rings().is_empty());
    }

    #[test]
    fn below_smurf_min_counterparties_is_not_a_ring() {
        let mut txns = Vec::new();
        for i in 0..5 {
            txns.push(txn(&format!("T{i}"), &format!("S{i}"), "H", 10.0, i));
        }
        let graph = TransactionGraph::build(&txns).unwrap();
        let config = AnalyzerConfig::default();
        let merchants = MerchantIndex::classify(&graph, &config);
        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(MergePolicy::Max, config.score_cap);
        run(
            &graph,
            &config,
            &merchants,
            &mut rings,
            &mut suspects,
            SmurfDirection::FanIn,
        );
        assert!(rings.rings().is_empty());
    }
}
