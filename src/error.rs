//! Error taxonomy for the forensic pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures the core pipeline can raise.
///
/// Resource exhaustion (a pass hitting its emission cap) is *not*
/// represented here; it is non-fatal and surfaces only via
/// `Summary::truncated`.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AnalysisError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("graph construction failed: {0}")]
    GraphConstruction(String),
}
