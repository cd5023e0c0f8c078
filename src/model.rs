//! Core data model: transactions, rings, and derived suspicion entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable input transaction row.
///
/// Well-formedness (unique `txn_id`, parseable timestamp, numeric
/// amount, present sender/receiver) is the responsibility of the
/// upstream parser; the core treats every row handed to it as valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub txn_id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// An account's role within a ring it participates in.
///
/// Declared in ascending priority so the derived `Ord` matches
/// `collector > source > layer` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Layer,
    Source,
    Collector,
}

/// The closed set of pattern typologies the pipeline can emit.
///
/// Matched exhaustively internally; `Display` renders the exact wire
/// string the output contract expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    Cycle,
    SmurfingFanIn,
    SmurfingFanOut,
    LayeredShell,
    Consolidation,
    Funnel,
    CrossFanInCycle,
    CrossFanOutCycle,
    CrossShellCycle,
    CrossFanOutShell,
    CrossConsolidationCycle,
    CrossShellFanIn,
}

impl PatternType {
    /// The ring-id prefix (`CYC`, `FIN`, `FOUT`, `SHELL`, `CONSOL`,
    /// `FUNNEL`, or `CROSS`) this pattern registers under. All six
    /// hybrid variants share the single `CROSS` prefix and counter.
    pub fn ring_prefix(self) -> &'static str {
        match self {
            PatternType::Cycle => "CYC",
            PatternType::SmurfingFanIn => "FIN",
            PatternType::SmurfingFanOut => "FOUT",
            PatternType::LayeredShell => "SHELL",
            PatternType::Consolidation => "CONSOL",
            PatternType::Funnel => "FUNNEL",
            PatternType::CrossFanInCycle
            | PatternType::CrossFanOutCycle
            | PatternType::CrossShellCycle
            | PatternType::CrossFanOutShell
            | PatternType::CrossConsolidationCycle
            | PatternType::CrossShellFanIn => "CROSS",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternType::Cycle => "cycle",
            PatternType::SmurfingFanIn => "smurfing_fan_in",
            PatternType::SmurfingFanOut => "smurfing_fan_out",
            PatternType::LayeredShell => "layered_shell",
            PatternType::Consolidation => "consolidation",
            PatternType::Funnel => "funnel",
            PatternType::CrossFanInCycle => "smurfing_fan_in\u{2192}cycle",
            PatternType::CrossFanOutCycle => "smurfing_fan_out\u{2192}cycle",
            PatternType::CrossShellCycle => "layered_shell\u{2192}cycle",
            PatternType::CrossFanOutShell => "smurfing_fan_out\u{2192}layered_shell",
            PatternType::CrossConsolidationCycle => "consolidation\u{2192}cycle",
            PatternType::CrossShellFanIn => "layered_shell\u{2192}smurfing_fan_in",
        };
        write!(f, "{s}")
    }
}

/// A synthesized finding. Append-only once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ring {
    pub ring_id: String,
    pub pattern_type: PatternType,
    pub member_accounts: Vec<String>,
    pub risk_score: f64,
    pub total_amount: f64,
    pub bridge_nodes: Vec<String>,
    pub overlap_with: Option<String>,
}

/// A derived per-account suspicion entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<String>,
    pub ring_id: String,
    pub role: Role,
}
