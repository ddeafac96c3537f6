//! CLI for seqbatch.

mod run;

use anyhow::Result;
use clap::Parser;
use seqbatch_core::scheduler::validate_max_threads;
use std::path::PathBuf;

/// Download public sequencing runs and assemble each one, spreading the
/// batch over thread tiers so the host's CPUs stay within budget.
#[derive(Debug, Parser)]
#[command(name = "seqbatch", version)]
#[command(about = "Download and assemble public sequencing runs in tiered parallel batches", long_about = None)]
pub struct Cli {
    /// File with the run IDs to download, one per line.
    #[arg(short = 'l', long = "list-run-ids", value_name = "FILE")]
    pub list_run_ids: PathBuf,

    /// Private key handed to the downloader (e.g. ~/.aspera/connect/etc/asperaweb_id_dsa.openssh).
    #[arg(short = 'a', long = "credentials", visible_alias = "aspera-key", value_name = "FILE")]
    pub credentials: PathBuf,

    /// Output directory.
    #[arg(short = 'o', long, default_value = ".", value_name = "DIR")]
    pub outdir: PathBuf,

    /// Maximum number of threads (4, 8, 16, 32, 64 or 128).
    ///
    /// Optional: defaults to 4, the smallest tier, so a bare run stays on one tier.
    #[arg(short = 'j', long, default_value = "4", value_name = "N", value_parser = parse_threads)]
    pub threads: u32,

    /// Config file to use instead of ~/.config/seqbatch/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for the run ID shuffle, for reproducible tier assignment.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Do not probe external programs before starting.
    #[arg(long)]
    pub skip_dependency_check: bool,
}

fn parse_threads(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|e| format!("{}", e))?;
    validate_max_threads(n).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        run::run_batch_command(cli).await
    }
}
