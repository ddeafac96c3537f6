//! Run banner, hardware snapshot and runtime formatting.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::process;

/// Local-time stamp shared by every artifact of one run.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

pub fn cpu_info_path(outdir: &Path, timestamp: &str) -> PathBuf {
    outdir.join(format!("cpu_information.{}.cpu.txt", timestamp))
}

/// Logs where and how the run was started.
pub fn log_general_information(transcript: Option<&Path>, version: &str) {
    tracing::info!("==========> seqbatch <==========");
    tracing::info!("Program start: {}", chrono::Local::now().format("%a %b %e %H:%M:%S %Y"));
    match transcript {
        Some(p) => tracing::info!("LOGFILE: {}", p.display()),
        None => tracing::info!("LOGFILE: (none, logging to stderr)"),
    }
    let command: Vec<String> = std::env::args().collect();
    tracing::info!("COMMAND: {}", command.join(" "));
    if let Ok(cwd) = std::env::current_dir() {
        tracing::info!("PRESENT DIRECTORY: {}", cwd.display());
    }
    tracing::info!("VERSION: {}", version);
    tracing::info!("PATH variable: {}", std::env::var("PATH").unwrap_or_default());
}

/// Captures `/proc/cpuinfo` into `cpu_information.<timestamp>.cpu.txt`.
/// A failed probe still leaves an (empty) snapshot file.
pub async fn save_cpu_information(outdir: &Path, timestamp: &str) -> Result<PathBuf> {
    let path = cpu_info_path(outdir, timestamp);
    let stdout = match process::run_command(&["cat", "/proc/cpuinfo"], None).await {
        Ok(out) => out.stdout,
        Err(e) => {
            tracing::warn!("could not read CPU information: {:#}", e);
            Vec::new()
        }
    };
    tokio::fs::write(&path, stdout)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// `Runtime :<h>h:<m>m:<s>s`
pub fn format_runtime(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let minutes = ((total - hours * 3600.0) / 60.0).floor();
    let seconds = total - hours * 3600.0 - minutes * 60.0;
    format!("Runtime :{}h:{}m:{:.2}s", hours, minutes, seconds)
}
