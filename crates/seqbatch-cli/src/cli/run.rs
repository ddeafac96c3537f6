//! Batch run: logging, run banner, input checks, dependency check, then the tiered scheduler.

use anyhow::Result;
use seqbatch_core::config::{self, SeqbatchConfig};
use seqbatch_core::pipeline::ExternalPipeline;
use seqbatch_core::scheduler::{self, BatchSettings, BatchSummary};
use seqbatch_core::{deps, jobs, logging, runinfo, BatchError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::Cli;

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn load_config(path: Option<&Path>) -> Result<SeqbatchConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

pub async fn run_batch_command(cli: Cli) -> Result<()> {
    let summary = execute(cli).await?;
    println!("{}", summary.message());
    Ok(())
}

async fn execute(cli: Cli) -> Result<BatchSummary> {
    let start = Instant::now();
    let outdir = absolute(&cli.outdir)?;
    let timestamp = runinfo::timestamp_now();

    let transcript = match logging::init_run_logging(&outdir, &timestamp) {
        Ok(path) => Some(path),
        Err(e) => {
            logging::init_logging_stderr();
            tracing::warn!("run transcript unavailable, logging to stderr: {:#}", e);
            None
        }
    };
    runinfo::log_general_information(transcript.as_deref(), env!("CARGO_PKG_VERSION"));

    let cfg = load_config(cli.config.as_deref())?;
    tracing::debug!("loaded config: {:?}", cfg);

    let credentials = absolute(&cli.credentials)?;
    if !credentials.is_file() {
        return Err(BatchError::MissingInput {
            what: "credentials file",
            path: credentials,
        }
        .into());
    }
    let run_ids = jobs::read_job_list(&absolute(&cli.list_run_ids)?)?;
    tracing::info!("{} run IDs to process", run_ids.len());

    if let Err(e) = runinfo::save_cpu_information(&outdir, &timestamp).await {
        tracing::warn!("{:#}", e);
    }

    if cfg.check_dependencies && !cli.skip_dependency_check {
        deps::ensure_programs(&cfg.dependencies).await?;
    }

    let settings = BatchSettings {
        outdir,
        credentials,
        max_threads: cli.threads,
        seed: cli.seed,
        timestamp,
    };
    let result =
        scheduler::run_batch(run_ids, &settings, Arc::new(ExternalPipeline::new(&cfg))).await;
    tracing::info!("{}", runinfo::format_runtime(start.elapsed()));

    let summary = result?;
    tracing::info!("{}", summary.message());
    Ok(summary)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    const DOWNLOADER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -l) list="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
id=$(head -n 1 "$list")
mkdir -p "$out/$id"
echo reads > "$out/$id/${id}_1.fastq.gz"
"#;

    const ASSEMBLER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    *) shift ;;
  esac
done
sample=$(basename "$in")
mkdir -p "$in/$sample"
printf '>contig1\nACGT\n' > "$in/$sample/$sample.contigs.fasta"
"#;

    fn script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    /// Writes fake tools, a config pointing at them and a two-ID list.
    fn setup(root: &Path) -> (PathBuf, PathBuf) {
        let downloader = root.join("fake-download");
        let assembler = root.join("fake-assemble");
        script(&downloader, DOWNLOADER);
        script(&assembler, ASSEMBLER);
        let config = root.join("config.toml");
        fs::write(
            &config,
            format!(
                "check_dependencies = false\n\n[downloader]\nprogram = {:?}\nlibrary_type = \"PE\"\n\n[assembler]\nprogram = {:?}\norganism = \"Campylobacter jejuni\"\ngenome_size = \"1.6\"\n",
                downloader.to_string_lossy(),
                assembler.to_string_lossy()
            ),
        )
        .unwrap();
        let list = root.join("ids.txt");
        fs::write(&list, "SRR1\nSRR2\n").unwrap();
        (config, list)
    }

    fn cli(list: &Path, credentials: &Path, outdir: &Path, config: &Path) -> Cli {
        let args: Vec<OsString> = vec![
            "seqbatch".into(),
            "-l".into(),
            list.as_os_str().to_os_string(),
            "-a".into(),
            credentials.as_os_str().to_os_string(),
            "-o".into(),
            outdir.as_os_str().to_os_string(),
            "--config".into(),
            config.as_os_str().to_os_string(),
            "--seed".into(),
            "7".into(),
            "--skip-dependency-check".into(),
        ];
        Cli::try_parse_from(args).unwrap()
    }

    #[tokio::test]
    async fn missing_credentials_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let (config, list) = setup(dir.path());
        let outdir = dir.path().join("out");

        let err = execute(cli(&list, &dir.path().join("no-key"), &outdir, &config))
            .await
            .unwrap_err();
        match err.downcast_ref::<BatchError>() {
            Some(BatchError::MissingInput { what, path }) => {
                assert_eq!(*what, "credentials file");
                assert_eq!(path, &dir.path().join("no-key"));
            }
            other => panic!("expected MissingInput, got {:?}", other),
        }
        assert!(!outdir.join("4_threads").exists());
    }

    #[tokio::test]
    async fn successful_run_reports_summary() {
        let dir = tempfile::tempdir().unwrap();
        let (config, list) = setup(dir.path());
        let key = dir.path().join("key.openssh");
        fs::write(&key, b"key").unwrap();
        let outdir = dir.path().join("out");

        let summary = execute(cli(&list, &key, &outdir, &config)).await.unwrap();
        assert_eq!(summary.successes, 2);
        assert_eq!(summary.total, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.message(), "2 samples out of 2 run successfully");
        for id in ["SRR1", "SRR2"] {
            let job_dir = outdir.join("4_threads").join(id);
            assert!(job_dir.join(format!("{}.contigs.fasta", id)).is_file());
            assert!(!job_dir.join(format!("{}_run_successfully.json", id)).exists());
        }
    }
}
