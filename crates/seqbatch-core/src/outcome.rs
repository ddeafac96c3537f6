//! Per-job outcome artifacts.
//!
//! Each worker leaves `<job>_run_successfully.json` (a JSON bool) and, on
//! success, `<job>_run_time.json` (elapsed seconds) in its own job directory.
//! The aggregator reads each artifact once and deletes it.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of one job, as seen by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobOutcome {
    pub success: bool,
    /// Wall time of download + assembly; set only on success.
    pub elapsed_secs: Option<f64>,
}

impl JobOutcome {
    pub fn succeeded(elapsed: Duration) -> Self {
        Self {
            success: true,
            elapsed_secs: Some(elapsed.as_secs_f64()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            elapsed_secs: None,
        }
    }
}

pub fn success_artifact(job_dir: &Path, job: &str) -> PathBuf {
    job_dir.join(format!("{}_run_successfully.json", job))
}

pub fn time_artifact(job_dir: &Path, job: &str) -> PathBuf {
    job_dir.join(format!("{}_run_time.json", job))
}

/// Writes the outcome artifacts, creating `job_dir` if the downloader never did.
pub fn persist(job_dir: &Path, job: &str, outcome: &JobOutcome) -> Result<()> {
    std::fs::create_dir_all(job_dir)
        .with_context(|| format!("create job dir: {}", job_dir.display()))?;
    if let Some(secs) = outcome.elapsed_secs.filter(|_| outcome.success) {
        let path = time_artifact(job_dir, job);
        std::fs::write(&path, serde_json::to_vec(&secs)?)
            .with_context(|| format!("write {}", path.display()))?;
    }
    let path = success_artifact(job_dir, job);
    std::fs::write(&path, serde_json::to_vec(&outcome.success)?)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Reads an artifact and deletes it. Returns `Ok(None)` if it is absent.
/// The file is removed even if its contents fail to parse.
pub fn take<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    std::fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse outcome artifact: {}", path.display()))?;
    Ok(Some(value))
}
