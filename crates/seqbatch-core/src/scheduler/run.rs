//! Whole-run driver: shuffle, plan, partition, then run and collect tier by tier.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::BatchError;
use crate::jobs::{self, JobId};
use crate::pipeline::JobPipeline;
use crate::report::{BatchReport, FailureRecord, TimingRecord};

use super::partition::partition;
use super::pool::{run_tier, tier_dir};
use super::tiers::{plan_workers, tiers_for_max};

/// Inputs of one batch run.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub outdir: PathBuf,
    pub credentials: PathBuf,
    /// One of [`super::ALLOWED_THREADS`].
    pub max_threads: u32,
    /// Fixes the shuffle order when set.
    pub seed: Option<u64>,
    /// Shared `%Y%m%d-%H%M%S` stamp for this run's artifacts.
    pub timestamp: String,
}

/// Final tallies of a run that had at least one success.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub successes: usize,
    pub total: usize,
    pub failures: Vec<FailureRecord>,
    pub timings: Vec<TimingRecord>,
}

impl BatchSummary {
    pub fn message(&self) -> String {
        format!(
            "{} samples out of {} run successfully",
            self.successes, self.total
        )
    }
}

/// Runs every job, one tier at a time.
///
/// Tier N+1 starts only after tier N has fully drained and been collected.
/// Returns `BatchError::NoSuccessfulJobs` if no job succeeded; the report
/// tables are on disk either way. Unusable run IDs are rejected before any
/// directory is created.
pub async fn run_batch<P: JobPipeline>(
    mut jobs: Vec<JobId>,
    settings: &BatchSettings,
    pipeline: Arc<P>,
) -> Result<BatchSummary> {
    let total = jobs.len();
    jobs::validate_job_ids(&jobs)?;
    std::fs::create_dir_all(&settings.outdir)
        .with_context(|| format!("create output directory: {}", settings.outdir.display()))?;

    let tiers = tiers_for_max(settings.max_threads)?;
    jobs::shuffle_jobs(&mut jobs, settings.seed);
    let workers = plan_workers(&tiers);
    let batches = partition(&jobs, &tiers)?;

    let mut report = BatchReport::create(&settings.outdir, &settings.timestamp)?;

    for batch in &batches {
        let threads = batch.threads;
        let worker_count = workers.get(&threads).copied().unwrap_or(1);
        tracing::info!(
            "Running for {} threads ({} samples, {} at a time)",
            threads,
            batch.jobs.len(),
            worker_count
        );
        let dir = tier_dir(&settings.outdir, threads);
        let run = run_tier(
            &dir,
            threads,
            &batch.jobs,
            worker_count,
            &settings.credentials,
            Arc::clone(&pipeline),
        )
        .await?;
        if run.panicked > 0 {
            tracing::error!("{} job(s) in {} threads tier panicked, recorded as failed", run.panicked, threads);
        }

        let found = report.collect_tier(&dir)?;
        tracing::info!("{} threads tier: {} of {} samples succeeded", threads, found, batch.jobs.len());
    }

    if report.successes == 0 {
        return Err(BatchError::NoSuccessfulJobs.into());
    }

    Ok(BatchSummary {
        successes: report.successes,
        total,
        failures: report.failures,
        timings: report.timings,
    })
}
