//! Builds the directed transaction multigraph and classifies merchant
//! accounts.

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::model::Transaction;
use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Weight carried by each edge of the transaction multigraph.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub txn_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Directed transaction multigraph keyed on account identifiers.
///
/// Nodes are assigned a dense integer `NodeIndex` by `petgraph` at
/// insertion time; a side map from the account's string id to its
/// index avoids hashing in the hot paths of the later passes.
pub struct TransactionGraph {
    graph: DiGraph<String, EdgeRecord>,
    index: HashMap<String, NodeIndex>,
}

impl TransactionGraph {
    /// Build the graph from an already-validated row set. Every row's
    /// sender/receiver is coerced to its string form and inserted (or
    /// reused) as a node; every row contributes exactly one edge, so
    /// edge count equals accepted transaction count.
    pub fn build(transactions: &[Transaction]) -> Result<Self, AnalysisError> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        let mut seen_txn_ids: HashSet<&str> = HashSet::new();

        for txn in transactions {
            if !seen_txn_ids.insert(txn.txn_id.as_str()) {
                return Err(AnalysisError::GraphConstruction(format!(
                    "duplicate transaction_id after upstream validation: {}",
                    txn.txn_id
                )));
            }

            let from = *index
                .entry(txn.sender.clone())
                .or_insert_with(|| graph.add_node(txn.sender.clone()));
            let to = *index
                .entry(txn.receiver.clone())
                .or_insert_with(|| graph.add_node(txn.receiver.clone()));

            graph.add_edge(
                from,
                to,
                EdgeRecord {
                    txn_id: txn.txn_id.clone(),
                    amount: txn.amount,
                    timestamp: txn.timestamp,
                },
            );
        }

        if graph.edge_count() != transactions.len() {
            return Err(AnalysisError::InvariantViolation(
                "edge count does not equal accepted transaction count".to_string(),
            ));
        }

        Ok(Self { graph, index })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_index(&self, account: &str) -> Option<NodeIndex> {
        self.index.get(account).copied()
    }

    pub fn account_id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// In-degree counted with multiplicity (parallel edges count
    /// separately), per the multigraph invariant.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    /// Out-degree counted with multiplicity.
    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Distinct out-neighbor node indices (node-level, collapsing
    /// parallel edges to the same target).
    pub fn successors(&self, idx: NodeIndex) -> HashSet<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Outgoing).collect()
    }

    /// All outgoing edges (sender's own side) as `(target, &EdgeRecord)`.
    pub fn out_edges(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeRecord)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
    }

    /// All incoming edges as `(source, &EdgeRecord)`.
    pub fn in_edges(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeRecord)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
    }

    /// Every account id, sorted (the canonical deterministic
    /// iteration order used by every pass).
    pub fn accounts_sorted(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        nodes
    }

    /// First/last activity timestamp across all edges incident to
    /// `idx` (either direction), in whole days. `None` if the account
    /// has no incident edges (cannot happen for a node actually
    /// present in the graph, since every node was created by an edge).
    pub fn activity_span_days(&self, idx: NodeIndex) -> i64 {
        let mut min_ts: Option<DateTime<Utc>> = None;
        let mut max_ts: Option<DateTime<Utc>> = None;
        for e in self.graph.edges_directed(idx, Direction::Outgoing) {
            let ts = e.weight().timestamp;
            min_ts = Some(min_ts.map_or(ts, |m| m.min(ts)));
            max_ts = Some(max_ts.map_or(ts, |m| m.max(ts)));
        }
        for e in self.graph.edges_directed(idx, Direction::Incoming) {
            let ts = e.weight().timestamp;
            min_ts = Some(min_ts.map_or(ts, |m| m.min(ts)));
            max_ts = Some(max_ts.map_or(ts, |m| m.max(ts)));
        }
        match (min_ts, max_ts) {
            (Some(a), Some(b)) => (b - a).num_days(),
            _ => 0,
        }
    }

    /// Sum of edge amounts whose both endpoints lie in `members`.
    /// Always computed exactly, never approximated above a size
    /// threshold.
    pub fn amount_within(&self, members: &HashSet<String>) -> f64 {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                if members.contains(&self.graph[a]) && members.contains(&self.graph[b]) {
                    Some(self.graph[e].amount)
                } else {
                    None
                }
            })
            .sum()
    }

    pub fn inner(&self) -> &DiGraph<String, EdgeRecord> {
        &self.graph
    }
}

/// Classifies high-throughput legitimate sinks as merchants.
///
/// Computed once before any pass emits rings; used to skip pivot
/// selection in the smurfing passes and to suppress suspicion
/// updates in the suspicion registry.
pub struct MerchantIndex {
    merchants: HashSet<String>,
}

impl MerchantIndex {
    pub fn classify(graph: &TransactionGraph, config: &AnalyzerConfig) -> Self {
        let mut merchants = HashSet::new();
        for idx in graph.accounts_sorted() {
            let in_deg = graph.in_degree(idx);
            let out_deg = graph.out_degree(idx);
            let span = graph.activity_span_days(idx);
            if in_deg >= config.merchant_min_in_degree
                && out_deg <= config.merchant_max_out_degree
                && span >= config.merchant_min_span_days
            {
                merchants.insert(graph.account_id(idx).to_string());
            }
        }
        Self { merchants }
    }

    pub fn is_merchant(&self, account: &str) -> bool {
        self.merchants.contains(account)
    }

    pub fn accounts(&self) -> &HashSet<String> {
        &self.merchants
    }
}
