//! Split the (already shuffled) job list into one contiguous slice per tier.

use crate::error::BatchError;
use crate::jobs::JobId;

/// Jobs assigned to one thread tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierBatch {
    pub threads: u32,
    pub jobs: Vec<JobId>,
}

/// Partitions `jobs` across `tiers` in the given tier order.
///
/// Each slice gets `n / k` jobs; the first `n % k` tiers get one extra.
/// Slices are contiguous, so concatenating them in order gives back `jobs`.
pub fn partition(jobs: &[JobId], tiers: &[u32]) -> Result<Vec<TierBatch>, BatchError> {
    if tiers.is_empty() {
        return Err(BatchError::NoTiers);
    }
    let base = jobs.len() / tiers.len();
    let remainder = jobs.len() % tiers.len();

    let mut start = 0;
    let batches = tiers
        .iter()
        .enumerate()
        .map(|(i, &threads)| {
            let len = if i < remainder { base + 1 } else { base };
            let slice = jobs[start..start + len].to_vec();
            start += len;
            TierBatch {
                threads,
                jobs: slice,
            }
        })
        .collect();
    Ok(batches)
}
