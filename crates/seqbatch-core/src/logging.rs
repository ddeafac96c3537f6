//! Logging init: run transcript in the output directory mirrored to the terminal,
//! or graceful fallback to stderr only.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Path of the transcript for a run started at `timestamp`.
pub fn transcript_path(outdir: &Path, timestamp: &str) -> PathBuf {
    outdir.join(format!("run.{}.log", timestamp))
}

/// Writes every event to stderr and, when available, to the transcript file.
struct TeeWriter {
    file: Option<fs::File>,
}

impl io::Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().lock().write_all(buf)?;
        if let Some(f) = self.file.as_mut() {
            f.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().lock().flush()?;
        if let Some(f) = self.file.as_mut() {
            f.flush()?;
        }
        Ok(())
    }
}

struct TeeMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        // Losing the file handle degrades to terminal-only output for this event.
        TeeWriter {
            file: self.0.try_clone().ok(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging to `<outdir>/run.<timestamp>.log` plus the terminal.
/// On failure (e.g. outdir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_run_logging(outdir: &Path, timestamp: &str) -> Result<PathBuf> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("create output directory: {}", outdir.display()))?;
    let log_file_path = transcript_path(outdir, timestamp);

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_file_path)
        .with_context(|| format!("open transcript: {}", log_file_path.display()))?;

    let writer: BoxMakeWriter = BoxMakeWriter::new(TeeMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {}", e))?;

    Ok(log_file_path)
}

/// Initialize logging to stderr only (no file). Use when init_run_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_path_uses_timestamp() {
        let p = transcript_path(Path::new("/data/out"), "20161025-101010");
        assert_eq!(p, PathBuf::from("/data/out/run.20161025-101010.log"));
    }

    #[test]
    fn tee_writer_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.log");
        let file = fs::File::create(&path).unwrap();
        let make = TeeMakeWriter(file);
        let mut w = make.make_writer();
        w.write_all(b"Running for 4 threads\n").unwrap();
        w.flush().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Running for 4 threads\n");
    }
}
