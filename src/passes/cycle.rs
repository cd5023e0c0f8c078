//! Detects circular routings via strongly-connected-component filtering.

use crate::config::AnalyzerConfig;
use crate::graph::TransactionGraph;
use crate::model::{PatternType, Role};
use crate::passes::all_clean_pool;
use crate::registry::{RingRegistry, SuspicionRegistry};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Whether the pass hit `MAX_CYCLES` and stopped emitting early.
pub struct CycleOutcome {
    pub truncated: bool,
}

/// Detect circular routings of length `CYCLE_MIN..=CYCLE_MAX`.
///
/// SCCs are processed in ascending size order so small, likely-real
/// rings register before massive super-components eat the cap.
pub fn run(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
) -> CycleOutcome {
    let mut sccs = tarjan_scc(graph.inner());
    sccs.sort_by_key(|scc| scc.len());

    let mut truncated = false;

    for scc in sccs {
        if rings.emitted_count(PatternType::Cycle) >= config.max_cycles {
            truncated = true;
            break;
        }
        if scc.len() < config.cycle_min || scc.len() > config.cycle_max {
            continue;
        }

        let ids: Vec<String> = scc
            .iter()
            .map(|&idx| graph.account_id(idx).to_string())
            .collect();
        if all_clean_pool(ids.iter(), &config.clean_pool_prefix) {
            continue;
        }

        let scc_set: HashSet<NodeIndex> = scc.iter().copied().collect();

        if is_clean_cycle(graph, &scc_set) {
            emit_cycle(graph, config, rings, suspects, sorted(ids));
            continue;
        }

        for cycle in enumerate_simple_cycles(graph, &scc_set, config.cycle_max) {
            if rings.emitted_count(PatternType::Cycle) >= config.max_cycles {
                truncated = true;
                break;
            }
            if cycle.len() < config.cycle_min {
                continue;
            }
            let member_ids: Vec<String> = cycle
                .iter()
                .map(|&idx| graph.account_id(idx).to_string())
                .collect();
            if all_clean_pool(member_ids.iter(), &config.clean_pool_prefix) {
                continue;
            }
            emit_cycle(graph, config, rings, suspects, sorted(member_ids));
        }
    }

    debug!(truncated, "cycle pass complete");
    CycleOutcome { truncated }
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

fn emit_cycle(
    graph: &TransactionGraph,
    config: &AnalyzerConfig,
    rings: &mut RingRegistry,
    suspects: &mut SuspicionRegistry,
    members: Vec<String>,
) {
    let len = members.len();
    let score = (80.0 + 4.0 * len as f64).min(96.0).min(config.score_cap);

    let ring_id = rings.register(
        PatternType::Cycle,
        members.clone(),
        score,
        Vec::new(),
        None,
        graph,
    );

    for (i, account) in members.iter().enumerate() {
        let role = if i == 0 { Role::Source } else { Role::Layer };
        suspects.update(account, score, "cycle", &ring_id, role, false);
    }
}

/// Checks the SCC induces exactly one simple rotation: `|SCC|` edges,
/// every member in-degree = out-degree = 1 within the subgraph.
fn is_clean_cycle(graph: &TransactionGraph, scc_set: &HashSet<NodeIndex>) -> bool {
    let mut edge_count = 0usize;
    let mut in_deg: HashMap<NodeIndex, usize> = HashMap::new();
    let mut out_deg: HashMap<NodeIndex, usize> = HashMap::new();

    for &idx in scc_set {
        for (target, _) in graph.out_edges(idx) {
            if scc_set.contains(&target) {
                edge_count += 1;
                *out_deg.entry(idx).or_insert(0) += 1;
                *in_deg.entry(target).or_insert(0) += 1;
            }
        }
    }

    edge_count == scc_set.len()
        && scc_set
            .iter()
            .all(|idx| in_deg.get(idx) == Some(&1) && out_deg.get(idx) == Some(&1))
}

/// Bounded per-SCC simple-cycle enumeration, length ≤ `max_len`. Each
/// start node only follows successors greater than itself (except the
/// closing edge back to `start`), so every cycle is discovered exactly
/// once, rooted at its minimum node. `seen_canonical` is a defensive
/// dedup on top of that pruning.
fn enumerate_simple_cycles(
    graph: &TransactionGraph,
    scc_set: &HashSet<NodeIndex>,
    max_len: usize,
) -> Vec<Vec<NodeIndex>> {
    let mut nodes: Vec<NodeIndex> = scc_set.iter().copied().collect();
    nodes.sort();

    let mut found: Vec<Vec<NodeIndex>> = Vec::new();
    let mut seen_canonical: HashSet<Vec<NodeIndex>> = HashSet::new();

    for &start in &nodes {
        let mut path = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        dfs_cycles(
            graph,
            scc_set,
            start,
            start,
            &mut path,
            &mut on_path,
            max_len,
            &mut found,
            &mut seen_canonical,
        );
    }
    found
}

#[allow(clippy::too_many_arguments)]
fn dfs_cycles(
    graph: &TransactionGraph,
    scc_set: &HashSet<NodeIndex>,
    start: NodeIndex,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut HashSet<NodeIndex>,
    max_len: usize,
    found: &mut Vec<Vec<NodeIndex>>,
    seen_canonical: &mut HashSet<Vec<NodeIndex>>,
) {
    if path.len() > max_len {
        return;
    }
    for (next, _) in graph.out_edges(current) {
        if !scc_set.contains(&next) {
            continue;
        }
        if next == start {
            if path.len() >= 2 {
                let canon = canonical_rotation(path);
                if seen_canonical.insert(canon) {
                    found.push(path.clone());
                }
            }
            continue;
        }
        if next <= start || on_path.contains(&next) {
            continue;
        }
        path.push(next);
        on_path.insert(next);
        dfs_cycles(
            graph,
            scc_set,
            start,
            next,
            path,
            on_path,
            max_len,
            found,
            seen_canonical,
        );
        path.pop();
        on_path.remove(&next);
    }
}

fn canonical_rotation(path: &[NodeIndex]) -> Vec<NodeIndex> {
    let n = path.len();
    let min_pos = (0..n).min_by_key(|&i| path[i]).unwrap_or(0);
    (0..n).map(|i| path[(min_pos + i) % n]).collect()
}
