//! # Rift Forensics
//!
//! A multi-pass, graph-analytic fraud-ring detector for batch financial
//! transaction analysis.
//!
//! ## Features
//!
//! - **Memory Safety**: built with Rust to prevent vulnerabilities in
//!   financial forensic tooling
//! - **Multigraph Construction**: in-degree/out-degree indexing with
//!   parallel-edge support
//! - **Circular Routing Detection**: SCC-filtered cycle enumeration
//! - **Smurfing Detection**: fan-in/fan-out aggregation with
//!   sliding-window density
//! - **Layered-Shell Detection**: forward chain tracing with
//!   cycle-avoidance
//! - **Consolidation/Funnel Detection**: diamond-topology co-successor
//!   analysis
//! - **Cross-Pattern Synthesis**: hybrid-ring detection from bridge
//!   accounts
//!
//! ## Alignment with Federal Guidance
//!
//! Implements anti-money-laundering typology detection in memory-safe
//! Rust, aligning with 2024 CISA/FBI guidance for critical financial
//! infrastructure.

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod passes;
pub mod registry;
pub mod report;

pub use config::{AnalyzerConfig, MergePolicy, ShellIntermediatePolicy};
pub use error::AnalysisError;
pub use graph::{MerchantIndex, TransactionGraph};
pub use model::{PatternType, Ring, Role, SuspiciousAccount, Transaction};
pub use registry::{RingRegistry, SuspicionRegistry};
pub use report::{Report, Summary, TruncationNotice};

use passes::smurfing::SmurfDirection;
use std::time::Instant;
use tracing::info;

/// Initialize the global `tracing` subscriber from `RUST_LOG`
/// (defaults to `info` when unset). Safe to call more than once; only
/// the first call takes effect.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// The forensic batch analyzer: runs the fixed multi-pass pipeline.
///
/// Owns no state across calls to [`ForensicAnalyzer::analyze`]; every
/// invocation builds a fresh graph and pair of registries, runs the
/// fixed pipeline, and returns an independent report.
pub struct ForensicAnalyzer {
    config: AnalyzerConfig,
}

impl ForensicAnalyzer {
    /// Create a new analyzer with default configuration.
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    /// Create a new analyzer with custom configuration.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline over a closed batch of transactions.
    pub fn analyze(&self, transactions: &[Transaction]) -> Result<Report, AnalysisError> {
        self.analyze_at(transactions, Instant::now())
    }

    /// Same as [`Self::analyze`] but with an injectable start instant,
    /// so `processing_time_seconds` is reproducible under test.
    pub fn analyze_at(
        &self,
        transactions: &[Transaction],
        start: Instant,
    ) -> Result<Report, AnalysisError> {
        let graph = TransactionGraph::build(transactions)?;
        let merchants = MerchantIndex::classify(&graph, &self.config);

        let mut rings = RingRegistry::new();
        let mut suspects = SuspicionRegistry::new(self.config.merge_policy, self.config.score_cap);
        let mut truncated = Vec::new();

        let cycle_outcome = passes::cycle::run(&graph, &self.config, &mut rings, &mut suspects);
        if cycle_outcome.truncated {
            truncated.push(TruncationNotice {
                pass: "cycle".to_string(),
                cap: self.config.max_cycles,
            });
        }

        passes::smurfing::run(
            &graph,
            &self.config,
            &merchants,
            &mut rings,
            &mut suspects,
            SmurfDirection::FanIn,
        );
        passes::smurfing::run(
            &graph,
            &self.config,
            &merchants,
            &mut rings,
            &mut suspects,
            SmurfDirection::FanOut,
        );

        passes::shell_chain::run(&graph, &self.config, &mut rings, &mut suspects);

        let funnel_outcome = passes::funnel::run(&graph, &self.config, &mut rings, &mut suspects);
        if funnel_outcome.truncated {
            truncated.push(TruncationNotice {
                pass: "consolidation_funnel".to_string(),
                cap: self.config.max_consol,
            });
        }

        passes::cross_pattern::run(&graph, &self.config, &mut rings, &mut suspects);

        let processing_time_seconds = start.elapsed().as_secs_f64();
        let total_accounts_analyzed = graph.node_count();
        let fraud_rings = rings.rings().to_vec();
        let suspicious_accounts = suspects.into_sorted_vec();

        info!(
            total_accounts_analyzed,
            suspicious_accounts_flagged = suspicious_accounts.len(),
            fraud_rings_detected = fraud_rings.len(),
            "analysis complete"
        );

        Ok(Report::assemble(
            suspicious_accounts,
            fraud_rings,
            total_accounts_analyzed,
            processing_time_seconds,
            truncated,
        ))
    }
}

impl Default for ForensicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn txn(id: &str, from: &str, to: &str, amount: f64, hour: i64) -> Transaction {
        Transaction {
            txn_id: id.to_string(),
            sender: from.to_string(),
            receiver: to.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
        }
    }

    #[test]
    fn empty_batch_yields_empty_report() {
        let analyzer = ForensicAnalyzer::new();
        let report = analyzer.analyze(&[]).unwrap();
        assert!(report.suspicious_accounts.is_empty());
        assert!(report.fraud_rings.is_empty());
        assert_eq!(report.summary.total_accounts_analyzed, 0);
    }

    #[test]
    fn pure_cycle_end_to_end_assigns_source_and_layer_roles() {
        let txns = vec![
            txn("T1", "A", "B", 1250.0, 0),
            txn("T2", "B", "C", 1250.0, 1),
            txn("T3", "C", "D", 1250.0, 2),
            txn("T4", "D", "A", 1250.0, 3),
        ];
        let analyzer = ForensicAnalyzer::new();
        let report = analyzer.analyze(&txns).unwrap();

        assert_eq!(report.fraud_rings.len(), 1);
        let ring = &report.fraud_rings[0];
        assert_eq!(ring.member_accounts, vec!["A", "B", "C", "D"]);
        assert_eq!(ring.risk_score, 96.0);
        assert_eq!(report.summary.fraud_rings_detected, 1);
        assert_eq!(report.summary.suspicious_accounts_flagged, 4);

        let source = report
            .suspicious_accounts
            .iter()
            .find(|a| a.account_id == "A")
            .unwrap();
        assert_eq!(source.role, Role::Source);
    }

    #[test]
    fn merchant_shield_suppresses_fan_in_ring() {
        let mut txns = Vec::new();
        for i in 0..200 {
            txns.push(txn(&format!("T{i}"), &format!("S{i}"), "MERCHANT", 50.0, i * 3));
        }
        let analyzer = ForensicAnalyzer::new();
        let report = analyzer.analyze(&txns).unwrap();

        assert!(!report
            .fraud_rings
            .iter()
            .any(|r| r.pattern_type == PatternType::SmurfingFanIn && r.member_accounts.contains(&"MERCHANT".to_string())));
        assert!(!report
            .suspicious_accounts
            .iter()
            .any(|a| a.account_id == "MERCHANT"));
    }

    #[test]
    fn duplicate_transaction_id_is_an_invariant_violation() {
        let txns = vec![
            txn("DUP", "A", "B", 100.0, 0),
            txn("DUP", "B", "C", 100.0, 1),
        ];
        let analyzer = ForensicAnalyzer::new();
        assert!(analyzer.analyze(&txns).is_err());
    }
}
