//! Thread tiers and the per-tier worker plan.
//!
//! A worker at tier `t` uses `t` threads, so it costs `t` units of a CPU
//! budget equal to the largest allowed tier. Running `max / t` workers at
//! tier `t` keeps a single tier within that budget.

use std::collections::BTreeMap;

use crate::error::BatchError;

/// Thread counts a run may use, ascending. `--threads` must be one of these.
pub const ALLOWED_THREADS: [u32; 6] = [4, 8, 16, 32, 64, 128];

fn allowed_list() -> String {
    ALLOWED_THREADS
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks closed-set membership of the configured maximum.
pub fn validate_max_threads(max_threads: u32) -> Result<u32, BatchError> {
    if ALLOWED_THREADS.contains(&max_threads) {
        Ok(max_threads)
    } else {
        Err(BatchError::InvalidMaxThreads(max_threads, allowed_list()))
    }
}

/// Allowed tiers not exceeding `max_threads`, ascending.
pub fn tiers_for_max(max_threads: u32) -> Result<Vec<u32>, BatchError> {
    validate_max_threads(max_threads)?;
    let tiers: Vec<u32> = ALLOWED_THREADS
        .iter()
        .copied()
        .filter(|&t| t <= max_threads)
        .collect();
    if tiers.is_empty() {
        return Err(BatchError::NoTiers);
    }
    Ok(tiers)
}

/// Number of concurrent workers per tier: `max_tier / tier`.
///
/// Empty input gives an empty plan; zero-thread tiers are ignored.
pub fn plan_workers(tiers: &[u32]) -> BTreeMap<u32, usize> {
    let mut sorted: Vec<u32> = tiers.iter().copied().filter(|&t| t > 0).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let Some(&max_tier) = sorted.first() else {
        return BTreeMap::new();
    };
    sorted
        .into_iter()
        .map(|t| (t, (max_tier / t) as usize))
        .collect()
}
