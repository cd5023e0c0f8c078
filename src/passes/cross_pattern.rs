//! Synthesizes hybrid rings from accounts bridging two typologies.

use crate::config::AnalyzerConfig;
use crate::graph::TransactionGraph;
use crate::model::{PatternType, Role};
use crate::registry::{RingRegistry, SuspicionRegistry};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The configured ordered `(A, B, hybrid label)` triples this pass checks.
const PAIRS: [(PatternType, PatternType, PatternType); 6] = [
    (PatternType::SmurfingFanIn, PatternType::Cycle, PatternType::CrossFanInCycle),
    (PatternType::SmurfingFanOut, PatternType::Cycle, PatternType::CrossFanOutCycle),
    (PatternType::LayeredShell, PatternType::Cycle, PatternType::CrossShellCycle),
    (PatternType::SmurfingFanOut, PatternType::LayeredShell, PatternType::CrossFanOutShell),
    (PatternType::Consolidation, PatternType::Cycle, PatternType::CrossConsolidationCycle),
    (PatternType::LayeredShell, PatternType::SmurfingFanIn, PatternType::CrossShellFanIn),
];

const MAX_NON_BRIDGE: usize = 10;

/// Find accounts bridging two rings of different typologies and
/// synthesize a hybrid ring for each bridged `(ring_a, ring_b)` pair.
pub fn run(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
) {
    let mut emitted = 0usize;

    for (a, b, hybrid) in PAIRS {
        let acc_a = rings.account_to_ring_of_type(a);
        let acc_b = rings.account_to_ring_of_type(b);

        let mut bridge_accounts: Vec<&String> = acc_a.keys().filter(|acct| acc_b.contains_key(*acct)).collect();
        bridge_accounts.sort();

        let mut groups: HashMap<(String, String), Vec<String>> = HashMap::new();
        for account in bridge_accounts {
            let r_a = &acc_a[account];
            let r_b = &acc_b[account];
            groups
                .entry((r_a.clone(), r_b.clone()))
                .or_default()
                .push(account.clone());
        }

        let mut group_keys: Vec<(String, String)> = groups.keys().cloned().collect();
        group_keys.sort();

        for key in group_keys {
            let mut bridges = groups.remove(&key).expect("key drawn from groups");
            bridges.sort();
            let (r_a, r_b) = key;

            let bridge_set: HashSet<String> = bridges.iter().cloned().collect();

            let members_a = rings.ring_members(&r_a).cloned().unwrap_or_default();
            let mut non_bridge_a: Vec<String> = members_a.difference(&bridge_set).cloned().collect();
            non_bridge_a.sort();
            non_bridge_a.truncate(MAX_NON_BRIDGE);

            let members_b = rings.ring_members(&r_b).cloned().unwrap_or_default();
            let mut non_bridge_b: Vec<String> = members_b.difference(&bridge_set).cloned().collect();
            non_bridge_b.sort();
            non_bridge_b.truncate(MAX_NON_BRIDGE);

            let mut members = bridges.clone();
            members.extend(non_bridge_a.iter().cloned());
            members.extend(non_bridge_b.iter().cloned());
            let mut seen = HashSet::new();
            members.retain(|m| seen.insert(m.clone()));

            let score = 98.0_f64.min(config.score_cap);
            let overlap_with = Some(format!("{r_a} \u{d7} {r_b}"));
            let tag = hybrid.to_string();

            let ring_id = rings.register(hybrid, members, score, bridges.clone(), overlap_with, graph);

            for bridge in &bridges {
                suspects.update(bridge, score, &tag, &ring_id, Role::Collector, false);
            }
            for member in non_bridge_a.iter().chain(non_bridge_b.iter()) {
                suspects.update(member, 0.9 * score, &tag, &ring_id, Role::Layer, false);
            }
            emitted += 1;
        }
    }

    debug!(emitted, "cross-pattern pass complete");
}
