//! Batch report: run-wide failure and timing tables, plus the per-tier
//! result aggregator that feeds them.
//!
//! Rows are written and flushed as they are found, so the tables on disk
//! are complete up to the last collected tier even if the run later aborts.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::jobs::JobId;
use crate::outcome;

#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub job: JobId,
    pub tier_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    pub job: JobId,
    pub tier_dir: PathBuf,
    pub elapsed_secs: f64,
}

pub fn failures_path(outdir: &Path, timestamp: &str) -> PathBuf {
    outdir.join(format!("samples_with_problems.{}.tab", timestamp))
}

pub fn timings_path(outdir: &Path, timestamp: &str) -> PathBuf {
    outdir.join(format!("running_times.{}.tab", timestamp))
}

/// Accumulated run state. Only the coordinator writes to it.
#[derive(Debug)]
pub struct BatchReport {
    failures_file: File,
    timings_file: File,
    pub successes: usize,
    pub failures: Vec<FailureRecord>,
    pub timings: Vec<TimingRecord>,
}

impl BatchReport {
    /// Creates (truncating) both tables under `outdir`.
    pub fn create(outdir: &Path, timestamp: &str) -> Result<Self> {
        let fp = failures_path(outdir, timestamp);
        let tp = timings_path(outdir, timestamp);
        let failures_file =
            File::create(&fp).with_context(|| format!("create {}", fp.display()))?;
        let timings_file =
            File::create(&tp).with_context(|| format!("create {}", tp.display()))?;
        Ok(Self {
            failures_file,
            timings_file,
            successes: 0,
            failures: Vec::new(),
            timings: Vec::new(),
        })
    }

    pub fn record_failure(&mut self, job: &str, tier_dir: &Path) -> Result<()> {
        writeln!(self.failures_file, "{}\t{}", job, tier_dir.display())?;
        self.failures_file.flush()?;
        self.failures.push(FailureRecord {
            job: job.to_string(),
            tier_dir: tier_dir.to_path_buf(),
        });
        Ok(())
    }

    pub fn record_timing(&mut self, job: &str, tier_dir: &Path, elapsed_secs: f64) -> Result<()> {
        writeln!(
            self.timings_file,
            "{}\t{}\t{:.2}",
            job,
            tier_dir.display(),
            elapsed_secs
        )?;
        self.timings_file.flush()?;
        self.timings.push(TimingRecord {
            job: job.to_string(),
            tier_dir: tier_dir.to_path_buf(),
            elapsed_secs,
        });
        Ok(())
    }

    /// Scans the job directories of a drained tier, consuming their outcome
    /// artifacts. Returns the number of successes found in this pass.
    ///
    /// Artifacts are deleted as they are read, so a second pass over the
    /// same directory finds nothing.
    pub fn collect_tier(&mut self, tier_dir: &Path) -> Result<usize> {
        let mut job_dirs: Vec<String> = fs::read_dir(tier_dir)
            .with_context(|| format!("list tier dir: {}", tier_dir.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        job_dirs.sort();

        let mut found = 0;
        for job in job_dirs {
            let job_dir = tier_dir.join(&job);
            let success = match outcome::take::<bool>(&outcome::success_artifact(&job_dir, &job)) {
                Ok(Some(s)) => s,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("{}: unreadable outcome, counting as failure: {:#}", job, e);
                    false
                }
            };
            let elapsed = match outcome::take::<f64>(&outcome::time_artifact(&job_dir, &job)) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("{}: unreadable running time: {:#}", job, e);
                    None
                }
            };

            if success {
                self.successes += 1;
                found += 1;
                if let Some(secs) = elapsed {
                    self.record_timing(&job, tier_dir, secs)?;
                }
            } else {
                self.record_failure(&job, tier_dir)?;
            }
        }
        Ok(found)
    }
}
