//! Assembles the sorted, final forensic report.

use crate::model::{Ring, SuspiciousAccount};
use serde::{Deserialize, Serialize};

/// Non-fatal notice that a pass stopped emitting early after hitting
/// its configured cap (resource exhaustion, not an error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncationNotice {
    pub pass: String,
    pub cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
    /// Not part of the wire contract's required fields but carried
    /// alongside it: which passes (if any) hit their emission cap.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub truncated: Vec<TruncationNotice>,
}

/// The final structured document returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<Ring>,
    pub summary: Summary,
}

impl Report {
    pub fn assemble(
        suspicious_accounts: Vec<SuspiciousAccount>,
        fraud_rings: Vec<Ring>,
        total_accounts_analyzed: usize,
        processing_time_seconds: f64,
        truncated: Vec<TruncationNotice>,
    ) -> Self {
        let summary = Summary {
            total_accounts_analyzed,
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds,
            truncated,
        };
        Self {
            suspicious_accounts,
            fraud_rings,
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PatternType, Role};

    #[test]
    fn summary_counts_match_inputs() {
        let accounts = vec![SuspiciousAccount {
            account_id: "A".to_string(),
            suspicion_score: 90.0,
            detected_patterns: vec!["cycle".to_string()],
            ring_id: "RING_CYC_001".to_string(),
            role: Role::Source,
        }];
        let rings = vec![Ring {
            ring_id: "RING_CYC_001".to_string(),
            pattern_type: PatternType::Cycle,
            member_accounts: vec!["A".to_string(), "B".to_string()],
            risk_score: 88.0,
            total_amount: 2500.0,
            bridge_nodes: vec![],
            overlap_with: None,
        }];
        let report = Report::assemble(accounts, rings, 10, 0.002, vec![]);
        assert_eq!(report.summary.suspicious_accounts_flagged, 1);
        assert_eq!(report.summary.fraud_rings_detected, 1);
        assert_eq!(report.summary.total_accounts_analyzed, 10);
        assert!(report.to_json().is_ok());
    }

    #[test]
    fn empty_input_yields_empty_collections_not_an_error() {
        let report = Report::assemble(vec![], vec![], 0, 0.0, vec![]);
        assert!(report.suspicious_accounts.is_empty());
        assert!(report.fraud_rings.is_empty());
        assert_eq!(report.summary.fraud_rings_detected, 0);
    }
}
