//! The fixed pipeline of graph-analytic detection passes.

pub mod cross_pattern;
pub mod cycle;
pub mod funnel;
pub mod shell_chain;
pub mod smurfing;

/// Shared helper: true iff every element of `ids` carries the
/// clean-pool prefix (used by the cycle and shell-chain passes as a
/// noise tiebreaker).
pub(crate) fn all_clean_pool<'a, I: IntoIterator<Item = &'a String>>(ids: I, prefix: &str) -> bool {
    let mut any = false;
    for id in ids {
        any = true;
        if !id.starts_with(prefix) {
            return false;
        }
    }
    any
}
