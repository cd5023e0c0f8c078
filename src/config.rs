//! Tunable surface for the detection pipeline.

/// How repeated suspicion updates for the same account are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// `score <- min(cap, max(existing, new))`. Matches the system's
    /// original merge behavior.
    Max,
    /// `score <- min(cap, existing + 0.35 * new)`.
    Additive,
}

/// Which rule gates whether a shell-chain intermediate node may extend
/// the chain further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellIntermediatePolicy {
    /// Intermediate nodes must have in-degree = 1 and out-degree = 1.
    Strict,
    /// Intermediate nodes must have total transaction count
    /// (in-degree + out-degree) within `[shell_min_total_tx, shell_max_total_tx]`.
    TotalTx,
}

/// Every recognized tunable, with the documented defaults.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub cycle_min: usize,
    pub cycle_max: usize,
    pub smurf_min: usize,
    pub smurf_window_hours: i64,
    pub shell_min_hops: usize,
    pub shell_min_total_tx: usize,
    pub shell_max_total_tx: usize,
    pub funnel_min_mules: usize,
    pub max_cycles: usize,
    pub max_consol: usize,
    pub score_cap: f64,
    pub merchant_min_in_degree: usize,
    pub merchant_max_out_degree: usize,
    pub merchant_min_span_days: i64,
    pub clean_pool_prefix: String,
    pub merge_policy: MergePolicy,
    pub shell_intermediate_policy: ShellIntermediatePolicy,
    /// Safety bound on shell-chain trace length, independent of
    /// `SHELL_MIN_HOPS` (guards against pathological all-degree-1
    /// subgraphs producing unbounded traces).
    pub shell_chain_cap: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cycle_min: 3,
            cycle_max: 6,
            smurf_min: 10,
            smurf_window_hours: 72,
            shell_min_hops: 3,
            shell_min_total_tx: 2,
            shell_max_total_tx: 3,
            funnel_min_mules: 3,
            max_cycles: 2000,
            max_consol: 200,
            score_cap: 100.0,
            merchant_min_in_degree: 25,
            merchant_max_out_degree: 3,
            merchant_min_span_days: 15,
            clean_pool_prefix: "CLN".to_string(),
            merge_policy: MergePolicy::Max,
            shell_intermediate_policy: ShellIntermediatePolicy::Strict,
            shell_chain_cap: 256,
        }
    }
}
