//! Tiered batch scheduler.
//!
//! Coordinates the run: job list → shuffle → tier plan → partition →
//! per-tier worker pool → result collection. Tiers run strictly one after
//! another so the per-tier CPU budget holds at every moment.

mod partition;
mod pool;
mod run;
mod tiers;

pub use partition::{partition, TierBatch};
pub use pool::{run_tier, tier_dir, TierRun};
pub use run::{run_batch, BatchSettings, BatchSummary};
pub use tiers::{plan_workers, tiers_for_max, validate_max_threads, ALLOWED_THREADS};
