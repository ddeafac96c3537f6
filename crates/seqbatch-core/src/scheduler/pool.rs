//! Bounded worker pool for one tier.
//!
//! Keeps up to `workers` jobs in flight; when one finishes, the next queued
//! job is started. Returns only after every job of the tier has finished.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fsutil;
use crate::jobs::JobId;
use crate::outcome::{self, JobOutcome};
use crate::pipeline::{self, JobContext, JobPipeline};

/// Working directory for a tier: `<outdir>/<threads>_threads`.
pub fn tier_dir(outdir: &Path, threads: u32) -> PathBuf {
    outdir.join(format!("{}_threads", threads))
}

/// Counts for one drained tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierRun {
    /// Jobs whose task ran to completion (successful or not).
    pub finished: usize,
    /// Jobs whose task panicked; each is recorded as a failed outcome.
    pub panicked: usize,
}

/// Runs one job in its own task. If that task panics, a failed outcome is
/// written in its place so the job still reaches the failures table.
async fn guard_job<P: JobPipeline>(
    worker: Arc<P>,
    ctx: JobContext,
) -> Result<(), tokio::task::JoinError> {
    let job_dir = ctx.job_dir();
    let job = ctx.job.clone();
    let task = tokio::spawn(async move { pipeline::process_job(worker.as_ref(), &ctx).await });
    match task.await {
        Ok(_) => Ok(()),
        Err(e) => {
            if let Err(pe) = outcome::persist(&job_dir, &job, &JobOutcome::failed()) {
                tracing::error!("{}: could not persist outcome: {:#}", job, pe);
            }
            Err(e)
        }
    }
}

/// Runs every job of one tier with at most `workers` in flight, then sweeps
/// tier-level scratch files.
pub async fn run_tier<P: JobPipeline>(
    tier_dir: &Path,
    threads: u32,
    jobs: &[JobId],
    workers: usize,
    credentials: &Path,
    pipeline: Arc<P>,
) -> Result<TierRun> {
    let workers = workers.max(1);
    tokio::fs::create_dir_all(tier_dir)
        .await
        .with_context(|| format!("create tier dir: {}", tier_dir.display()))?;
    tracing::debug!(threads, workers, jobs = jobs.len(), "tier pool starting");

    let mut queue = jobs.iter();
    let mut join_set = tokio::task::JoinSet::new();
    let mut run = TierRun::default();

    loop {
        while join_set.len() < workers {
            let Some(job) = queue.next() else {
                break;
            };
            let ctx = JobContext {
                tier_dir: tier_dir.to_path_buf(),
                job: job.clone(),
                credentials: credentials.to_path_buf(),
                threads,
            };
            let worker = Arc::clone(&pipeline);
            join_set.spawn(guard_job(worker, ctx));
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        match res {
            Ok(Ok(())) => run.finished += 1,
            Ok(Err(e)) => {
                run.panicked += 1;
                tracing::error!("job task join: {}", e);
            }
            Err(e) => {
                run.panicked += 1;
                tracing::error!("job guard join: {}", e);
            }
        }
    }

    fsutil::sweep(tier_dir, &fsutil::TIER_SCRATCH_SUFFIXES);
    Ok(run)
}
