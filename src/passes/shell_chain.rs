//! Detects linear pass-through relay chains of laundering mules.

use crate::config::{AnalyzerConfig, ShellIntermediatePolicy};
use crate::graph::TransactionGraph;
use crate::model::{PatternType, Role};
use crate::passes::all_clean_pool;
use crate::registry::{RingRegistry, SuspicionRegistry};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use tracing::debug;

/// Detect linear pass-through chains of `SHELL_MIN_HOPS` or more hops.
///
/// Chains never overlap: every member is added to a single global
/// `visited` set on acceptance, so later heads cannot re-walk an
/// already-registered chain.
pub fn run(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
) {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut emitted = 0usize;

    for head in graph.accounts_sorted() {
        if visited.contains(&head) {
            continue;
        }
        if graph.in_degree(head) > 1 || graph.out_degree(head) != 1 {
            continue;
        }

        let chain = trace_chain(graph, config, head, &visited);
        if chain.len() < config.shell_min_hops + 1 {
            continue;
        }

        let ids: Vec<String> = chain.iter().map(|&idx| graph.account_id(idx).to_string()).collect();
        if all_clean_pool(ids.iter(), &config.clean_pool_prefix) {
            continue;
        }

        visited.extend(chain.iter().copied());
        emit_chain(graph, config, rings, suspects, ids);
        emitted += 1;
    }

    debug!(emitted, "shell-chain pass complete");
}

/// Walks forward from `head` while the current node has exactly one
/// successor and the reached node is admissible under the configured
/// intermediate policy; the first node that fails the policy (or ends
/// the trace for any other reason) becomes the chain's tail.
fn trace_chain(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    head: NodeIndex,
    visited: &HashSet<NodeIndex>,
) -> Vec<NodeIndex> {
    let mut chain = vec![head];
    let mut chain_set: HashSet<NodeIndex> = HashSet::from([head]);
    let mut current = head;

    loop {
        if chain.len() >= config.shell_chain_cap {
            break;
        }
        if graph.out_degree(current) != 1 {
            break;
        }
        let next = match graph.successors(current).into_iter().next() {
            Some(n) => n,
            None => break,
        };
        if chain_set.contains(&next) || visited.contains(&next) {
            break;
        }

        chain.push(next);
        chain_set.insert(next);
        let admissible = match config.shell_intermediate_policy {
            ShellIntermediatePolicy::Strict => {
                graph.in_degree(next) == 1 && graph.out_degree(next) == 1
            }
            ShellIntermediatePolicy::TotalTx => {
                let total = graph.in_degree(next) + graph.out_degree(next);
                total >= config.shell_min_total_tx && total <= config.shell_max_total_tx
            }
        };
        current = next;
        if !admissible {
            break;
        }
    }
    chain
}

fn emit_chain(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
    members: Vec<String>,
) {
    let hops = (members.len() - 1) as f64;
    let score = (65.0 + 5.0 * hops).min(95.0).min(config.score_cap);
    let tag = PatternType::LayeredShell.to_string();

    let ring_id = rings.register(
        PatternType::LayeredShell,
        members.clone(),
        score,
        Vec::new(),
        None,
        graph,
    );

    let last = members.len() - 1;
    for (i, account) in members.iter().enumerate() {
        let role = if i == 0 {
            Role::Source
        } else if i == last {
            Role::Collector
        } else {
            Role::Layer
        };
        suspects.update(account, score, &tag, &ring_id, role, false);
    }
}
