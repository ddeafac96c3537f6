//! Run-level error taxonomy.
//!
//! Only configuration problems and "nothing succeeded" end a run. Per-job
//! failures are data (see [`crate::outcome::JobOutcome`]), never errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The job list parsed to zero identifiers.
    #[error("No runIDs were found in {}", .0.display())]
    EmptyJobList(PathBuf),

    /// A required input file (job list, credentials) does not exist.
    #[error("{what} not found: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    /// A run ID that cannot be used as a single directory name.
    #[error("invalid run ID {0:?}: must not be empty, start with '.' or contain a path separator")]
    InvalidJobId(String),

    /// Max threads outside the allowed tier set.
    #[error("invalid maximum threads {0} (allowed: {1})")]
    InvalidMaxThreads(u32, String),

    #[error("no thread tiers available for this run")]
    NoTiers,

    /// Every missing or under-versioned external tool, reported together.
    #[error("\nErrors:\n{}", .0.join("\n"))]
    MissingDependencies(Vec<String>),

    #[error("No RunIDs were successfully run!")]
    NoSuccessfulJobs,
}
