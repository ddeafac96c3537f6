//! Small filesystem helpers for job and tier directories.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Scratch files removed from each job directory once the job finishes.
pub const JOB_SCRATCH_SUFFIXES: [&str; 3] = [".gz", ".log", ".cpu.txt"];

/// Leftovers removed from a tier directory after its pool drains.
pub const TIER_SCRATCH_SUFFIXES: [&str; 3] =
    [".log", "getSeqENA.samples_with_problems.txt", ".cpu.txt"];

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Removes non-hidden files (or symlinks) in `dir` whose name ends with `suffix`.
/// Returns how many were removed. A missing directory removes nothing.
pub fn remove_files_with_suffix(dir: &Path, suffix: &str) -> Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("list {}", dir.display())),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) || !name.ends_with(suffix) {
            continue;
        }
        let file_type = entry.file_type()?;
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        fs::remove_file(entry.path())
            .with_context(|| format!("remove {}", entry.path().display()))?;
        removed += 1;
    }
    Ok(removed)
}

/// Removes every suffix in `suffixes` from `dir`, logging rather than failing.
pub fn sweep(dir: &Path, suffixes: &[&str]) {
    for suffix in suffixes {
        match remove_files_with_suffix(dir, suffix) {
            Ok(0) => {}
            Ok(n) => tracing::debug!(dir = %dir.display(), suffix, removed = n, "swept scratch files"),
            Err(e) => tracing::warn!("could not sweep {} files in {}: {:#}", suffix, dir.display(), e),
        }
    }
}

/// Moves the regular files of `nested` into `into`, then deletes `nested`.
/// Returns the number of files moved; a missing `nested` moves nothing.
pub fn flatten_dir(nested: &Path, into: &Path) -> Result<usize> {
    if !nested.is_dir() {
        return Ok(0);
    }
    let mut moved = 0;
    for entry in fs::read_dir(nested).with_context(|| format!("list {}", nested.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if is_hidden(&name.to_string_lossy()) || !entry.file_type()?.is_file() {
            continue;
        }
        let target = into.join(&name);
        fs::rename(entry.path(), &target).with_context(|| {
            format!("move {} -> {}", entry.path().display(), target.display())
        })?;
        moved += 1;
    }
    fs::remove_dir_all(nested).with_context(|| format!("remove {}", nested.display()))?;
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_by_suffix_keeps_others_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        fs::write(p.join("reads_1.fastq.gz"), b"x").unwrap();
        fs::write(p.join("reads_2.fastq.gz"), b"x").unwrap();
        fs::write(p.join(".hidden.gz"), b"x").unwrap();
        fs::write(p.join("assembly.fasta"), b"x").unwrap();
        fs::create_dir(p.join("dir.gz")).unwrap();

        assert_eq!(remove_files_with_suffix(p, ".gz").unwrap(), 2);
        assert!(!p.join("reads_1.fastq.gz").exists());
        assert!(p.join(".hidden.gz").exists());
        assert!(p.join("assembly.fasta").exists());
        assert!(p.join("dir.gz").is_dir());
    }

    #[test]
    fn remove_in_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(remove_files_with_suffix(&dir.path().join("none"), ".log").unwrap(), 0);
    }

    #[test]
    fn flatten_moves_files_and_removes_nested() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("ERR1");
        let nested = job.join("ERR1");
        fs::create_dir_all(nested.join("sub")).unwrap();
        fs::write(nested.join("assembly.fasta"), b">c1\nACGT\n").unwrap();
        fs::write(nested.join("report.tab"), b"ok").unwrap();
        fs::write(nested.join("sub").join("deep.txt"), b"x").unwrap();

        assert_eq!(flatten_dir(&nested, &job).unwrap(), 2);
        assert!(job.join("assembly.fasta").is_file());
        assert!(job.join("report.tab").is_file());
        assert!(!nested.exists());
    }

    #[test]
    fn flatten_missing_nested_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(flatten_dir(&dir.path().join("x"), dir.path()).unwrap(), 0);
    }
}
