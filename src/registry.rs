//! Tracks per-account suspicion and registers fraud rings.

use crate::config::MergePolicy;
use crate::graph::TransactionGraph;
use crate::model::{PatternType, Ring, Role, SuspiciousAccount};
use std::collections::{HashMap, HashSet};

/// Maintains per-account aggregated score, patterns and dominant role.
/// Append/merge only; a merchant account is a no-op.
pub struct SuspicionRegistry {
    accounts: HashMap<String, SuspiciousAccount>,
    merge_policy: MergePolicy,
    score_cap: f64,
}

impl SuspicionRegistry {
    pub fn new(merge_policy: MergePolicy, score_cap: f64) -> Self {
        Self {
            accounts: HashMap::new(),
            merge_policy,
            score_cap,
        }
    }

    /// Apply one per-account update. `is_merchant` gates the whole
    /// update to a no-op.
    pub fn update(
        &mut self,
        account: &str,
        score: f64,
        pattern_tag: &str,
        ring_id: &str,
        role: Role,
        is_merchant: bool,
    ) {
        if is_merchant {
            return;
        }
        let capped = score.min(self.score_cap);

        match self.accounts.get_mut(account) {
            None => {
                self.accounts.insert(
                    account.to_string(),
                    SuspiciousAccount {
                        account_id: account.to_string(),
                        suspicion_score: capped,
                        detected_patterns: vec![pattern_tag.to_string()],
                        ring_id: ring_id.to_string(),
                        role,
                    },
                );
            }
            Some(existing) => {
                existing.suspicion_score = match self.merge_policy {
                    MergePolicy::Max => existing.suspicion_score.max(capped).min(self.score_cap),
                    MergePolicy::Additive => {
                        (existing.suspicion_score + 0.35 * capped).min(self.score_cap)
                    }
                };
                if !existing.detected_patterns.iter().any(|p| p == pattern_tag) {
                    existing.detected_patterns.push(pattern_tag.to_string());
                }
                if role > existing.role {
                    existing.role = role;
                }
            }
        }
    }

    /// Final, sorted by suspicion_score descending, ties broken by
    /// account_id for deterministic output.
    pub fn into_sorted_vec(self) -> Vec<SuspiciousAccount> {
        let mut accounts: Vec<SuspiciousAccount> = self.accounts.into_values().collect();
        accounts.sort_by(|a, b| {
            b.suspicion_score
                .partial_cmp(&a.suspicion_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Append-only registry of rings and their derived indices.
pub struct RingRegistry {
    rings: Vec<Ring>,
    ring_members: HashMap<String, HashSet<String>>,
    account_rings: HashMap<String, Vec<String>>,
    rings_by_type: HashMap<PatternType, Vec<String>>,
    cycle_members: HashSet<String>,
    counters: HashMap<&'static str, u32>,
}

impl RingRegistry {
    pub fn new() -> Self {
        Self {
            rings: Vec::new(),
            ring_members: HashMap::new(),
            account_rings: HashMap::new(),
            rings_by_type: HashMap::new(),
            cycle_members: HashSet::new(),
            counters: HashMap::new(),
        }
    }

    fn next_id(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("RING_{prefix}_{:03}", *counter)
    }

    /// Register a new ring. `total_amount` is computed here by
    /// scanning the graph's accepted edges, never approximated.
    pub fn register(
        &mut self,
        pattern_type: PatternType,
        member_accounts: Vec<String>,
        risk_score: f64,
        bridge_nodes: Vec<String>,
        overlap_with: Option<String>,
        graph: &TransactionGraph,
    ) -> String {
        let ring_id = self.next_id(pattern_type.ring_prefix());
        let member_set: HashSet<String> = member_accounts.iter().cloned().collect();
        let total_amount = graph.amount_within(&member_set);

        for member in &member_accounts {
            self.account_rings
                .entry(member.clone())
                .or_default()
                .push(ring_id.clone());
        }
        self.rings_by_type
            .entry(pattern_type)
            .or_default()
            .push(ring_id.clone());

        if pattern_type == PatternType::Cycle {
            self.cycle_members.extend(member_set.iter().cloned());
        }

        self.ring_members.insert(ring_id.clone(), member_set);
        self.rings.push(Ring {
            ring_id: ring_id.clone(),
            pattern_type,
            member_accounts,
            risk_score,
            total_amount,
            bridge_nodes,
            overlap_with,
        });
        ring_id
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn cycle_members(&self) -> &HashSet<String> {
        &self.cycle_members
    }

    /// Union of member sets of every CYC ring `account` belongs to.
    pub fn cycle_peers(&self, account: &str) -> HashSet<String> {
        let mut peers = HashSet::new();
        if let Some(ring_ids) = self.account_rings.get(account) {
            for ring_id in ring_ids {
                if let Some(members) = self.ring_members.get(ring_id) {
                    if self
                        .rings
                        .iter()
                        .find(|r| &r.ring_id == ring_id)
                        .map(|r| r.pattern_type == PatternType::Cycle)
                        .unwrap_or(false)
                    {
                        peers.extend(members.iter().cloned());
                    }
                }
            }
        }
        peers
    }

    pub fn ring_members(&self, ring_id: &str) -> Option<&HashSet<String>> {
        self.ring_members.get(ring_id)
    }

    pub fn rings_of_type(&self, pattern_type: PatternType) -> &[String] {
        self.rings_by_type
            .get(&pattern_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// `account -> ring_id` built from every ring of `pattern_type`,
    /// in registration order (last ring wins on collision).
    pub fn account_to_ring_of_type(&self, pattern_type: PatternType) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for ring_id in self.rings_of_type(pattern_type) {
            if let Some(members) = self.ring_members.get(ring_id) {
                for member in members {
                    map.insert(member.clone(), ring_id.clone());
                }
            }
        }
        map
    }

    pub fn emitted_count(&self, pattern_type: PatternType) -> usize {
        self.rings_of_type(pattern_type).len()
    }
}

impl Default for RingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transaction;
    use chrono::Utc;

    fn graph_fixture() -> TransactionGraph {
        let txns = vec![Transaction {
            txn_id: "T1".to_string(),
            sender: "A".to_string(),
            receiver: "B".to_string(),
            amount: 500.0,
            timestamp: Utc::now(),
        }];
        TransactionGraph::build(&txns).unwrap()
    }

    #[test]
    fn max_merge_policy_takes_higher_score() {
        let mut reg = SuspicionRegistry::new(MergePolicy::Max, 100.0);
        reg.update("A", 50.0, "cycle", "RING_CYC_001", Role::Layer, false);
        reg.update("A", 80.0, "cycle", "RING_CYC_001", Role::Layer, false);
        let out = reg.into_sorted_vec();
        assert_eq!(out[0].suspicion_score, 80.0);
    }

    #[test]
    fn merchant_update_is_noop() {
        let mut reg = SuspicionRegistry::new(MergePolicy::Max, 100.0);
        reg.update("M", 90.0, "cycle", "RING_CYC_001", Role::Layer, true);
        assert!(reg.is_empty());
    }

    #[test]
    fn role_upgrades_by_priority_only() {
        let mut reg = SuspicionRegistry::new(MergePolicy::Max, 100.0);
        reg.update("A", 50.0, "cycle", "RING_CYC_001", Role::Layer, false);
        reg.update("A", 50.0, "funnel", "RING_FUNNEL_001", Role::Collector, false);
        let out = reg.into_sorted_vec();
        assert_eq!(out[0].role, Role::Collector);
    }

    #[test]
    fn ring_registry_assigns_sequential_ids_per_prefix() {
        let graph = graph_fixture();
        let mut reg = RingRegistry::new();
        let id1 = reg.register(
            PatternType::Cycle,
            vec!["A".to_string(), "B".to_string()],
            90.0,
            vec![],
            None,
            &graph,
        );
        let id2 = reg.register(
            PatternType::Cycle,
            vec!["A".to_string(), "B".to_string()],
            90.0,
            vec![],
            None,
            &graph,
        );
        assert_eq!(id1, "RING_CYC_001");
        assert_eq!(id2, "RING_CYC_002");
        assert_eq!(reg.rings()[0].total_amount, 500.0);
    }
}
