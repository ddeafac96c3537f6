//! Job list: reading run identifiers and shuffling them before partitioning.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;

use crate::error::BatchError;

/// One dataset identifier (e.g. an ENA run accession).
pub type JobId = String;

/// Parses job identifiers: one per line, whitespace trimmed, blank lines skipped,
/// duplicates dropped (first occurrence wins).
pub fn parse_job_list(content: &str) -> Vec<JobId> {
    let mut seen = HashSet::new();
    let mut jobs = Vec::new();
    for line in content.lines() {
        let id = line.trim();
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.to_string()) {
            tracing::warn!("duplicate run ID {} ignored", id);
            continue;
        }
        jobs.push(id.to_string());
    }
    jobs
}

/// Checks that a run ID is usable as one directory name under a tier dir.
///
/// Dot-prefixed names are rejected too: `.` and `..` escape the tier dir, and
/// the aggregator skips hidden job dirs.
pub fn validate_job_id(id: &str) -> Result<(), BatchError> {
    let bad = id.is_empty() || id.starts_with('.') || id.contains(['/', '\\', '\0']);
    if bad {
        Err(BatchError::InvalidJobId(id.to_string()))
    } else {
        Ok(())
    }
}

/// Fails on the first unusable run ID.
pub fn validate_job_ids(jobs: &[JobId]) -> Result<(), BatchError> {
    jobs.iter().try_for_each(|id| validate_job_id(id))
}

/// Reads the job list file. An empty list or an unusable ID is a configuration error.
pub fn read_job_list(path: &Path) -> Result<Vec<JobId>> {
    if !path.is_file() {
        return Err(BatchError::MissingInput {
            what: "run ID list",
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read run ID list: {}", path.display()))?;
    let jobs = parse_job_list(&content);
    if jobs.is_empty() {
        return Err(BatchError::EmptyJobList(path.to_path_buf()).into());
    }
    validate_job_ids(&jobs)?;
    Ok(jobs)
}

/// Shuffles jobs in place so input order does not correlate with tier assignment.
/// A seed makes the order reproducible.
pub fn shuffle_jobs(jobs: &mut [JobId], seed: Option<u64>) {
    match seed {
        Some(seed) => jobs.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => jobs.shuffle(&mut rand::thread_rng()),
    }
}
