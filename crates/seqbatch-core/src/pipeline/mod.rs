//! Per-job work: download, assemble, tidy the job directory, persist the outcome.
//!
//! The two external steps sit behind [`JobPipeline`]; [`process_job`] owns
//! the ordering and the bookkeeping around them so every implementation
//! gets the same cleanup and outcome handling.

mod external;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::fsutil;
use crate::jobs::JobId;
use crate::outcome::{self, JobOutcome};

pub use external::ExternalPipeline;

/// Everything a worker needs to run one job.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// `<outdir>/<threads>_threads`; shared by all jobs of the tier.
    pub tier_dir: PathBuf,
    pub job: JobId,
    /// Credentials file handed to the downloader.
    pub credentials: PathBuf,
    pub threads: u32,
}

impl JobContext {
    /// Directory owned by this job alone.
    pub fn job_dir(&self) -> PathBuf {
        self.tier_dir.join(&self.job)
    }

    /// Where the assembler leaves its results before flattening.
    pub fn nested_results_dir(&self) -> PathBuf {
        self.job_dir().join(&self.job)
    }
}

/// External steps of a job. Failures are reported as `false`, never raised.
pub trait JobPipeline: Send + Sync + 'static {
    /// Fetches the job's data into `ctx.job_dir()`.
    fn download(&self, ctx: &JobContext) -> impl Future<Output = bool> + Send;

    /// Runs the assembly on `ctx.job_dir()` with `ctx.threads` threads.
    fn assemble(&self, ctx: &JobContext) -> impl Future<Output = bool> + Send;
}

fn tidy_job_dir(ctx: &JobContext, job_dir: &Path, assembled_run: bool) {
    if assembled_run {
        match fsutil::flatten_dir(&ctx.nested_results_dir(), job_dir) {
            Ok(n) => tracing::debug!(job = %ctx.job, moved = n, "flattened results"),
            Err(e) => tracing::warn!("{}: could not flatten results: {:#}", ctx.job, e),
        }
    }
    fsutil::sweep(job_dir, &fsutil::JOB_SCRATCH_SUFFIXES);
}

/// Runs one job end to end and persists its outcome in the job directory.
///
/// Nothing here escapes as an error: a failed step becomes a failed outcome
/// and the worker moves on to the next job.
pub async fn process_job<P: JobPipeline>(pipeline: &P, ctx: &JobContext) -> JobOutcome {
    let start = Instant::now();
    let job_dir = ctx.job_dir();

    let downloaded = pipeline.download(ctx).await;
    let assembled = if downloaded {
        pipeline.assemble(ctx).await
    } else {
        tracing::warn!("{}: download failed, assembly skipped", ctx.job);
        false
    };
    tidy_job_dir(ctx, &job_dir, downloaded);

    let outcome = if assembled {
        let outcome = JobOutcome::succeeded(start.elapsed());
        tracing::info!(
            "{}: finished in {:.1}s ({} threads)",
            ctx.job,
            outcome.elapsed_secs.unwrap_or_default(),
            ctx.threads
        );
        outcome
    } else {
        tracing::warn!("{}: failed ({} threads)", ctx.job, ctx.threads);
        JobOutcome::failed()
    };

    if let Err(e) = outcome::persist(&job_dir, &ctx.job, &outcome) {
        tracing::error!("{}: could not persist outcome: {:#}", ctx.job, e);
    }
    outcome
}
