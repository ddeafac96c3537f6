//! Production pipeline: downloader and assembler run as child processes.

use std::ffi::OsString;

use crate::config::{AssemblerConfig, DownloaderConfig, SeqbatchConfig};
use crate::process;

use super::{JobContext, JobPipeline};

/// Invokes the configured downloader and assembler programs.
#[derive(Debug, Clone)]
pub struct ExternalPipeline {
    downloader: DownloaderConfig,
    assembler: AssemblerConfig,
}

impl ExternalPipeline {
    pub fn new(cfg: &SeqbatchConfig) -> Self {
        Self {
            downloader: cfg.downloader.clone(),
            assembler: cfg.assembler.clone(),
        }
    }

    fn download_args(&self, ctx: &JobContext, list_file: &std::path::Path) -> Vec<OsString> {
        vec![
            OsString::from(&self.downloader.program),
            "-l".into(),
            list_file.into(),
            "-o".into(),
            ctx.tier_dir.clone().into(),
            "-a".into(),
            ctx.credentials.clone().into(),
            "--downloadLibrariesType".into(),
            OsString::from(&self.downloader.library_type),
        ]
    }

    fn assemble_args(&self, ctx: &JobContext) -> Vec<OsString> {
        let job_dir = ctx.job_dir();
        let mut args: Vec<OsString> = vec![
            OsString::from(&self.assembler.program),
            "-i".into(),
            job_dir.clone().into(),
            "-s".into(),
            OsString::from(&self.assembler.organism),
            "-g".into(),
            OsString::from(&self.assembler.genome_size),
            "-o".into(),
            job_dir.into(),
            "-j".into(),
            ctx.threads.to_string().into(),
        ];
        args.extend(self.assembler.extra_args.iter().map(OsString::from));
        args
    }
}

impl JobPipeline for ExternalPipeline {
    async fn download(&self, ctx: &JobContext) -> bool {
        let list_file = ctx
            .tier_dir
            .join(format!("{}.temp.runID_fileList.txt", ctx.job));
        if let Err(e) = tokio::fs::write(&list_file, format!("{}\n", ctx.job)).await {
            tracing::warn!("{}: could not write run ID list {}: {}", ctx.job, list_file.display(), e);
            return false;
        }

        let args = self.download_args(ctx, &list_file);
        let ok = match process::run_command(&args, self.downloader.timeout()).await {
            Ok(out) => out.success,
            Err(e) => {
                tracing::warn!("{}: downloader did not run: {:#}", ctx.job, e);
                false
            }
        };

        if let Err(e) = tokio::fs::remove_file(&list_file).await {
            tracing::debug!("{}: temp list not removed: {}", ctx.job, e);
        }
        ok
    }

    async fn assemble(&self, ctx: &JobContext) -> bool {
        let args = self.assemble_args(ctx);
        match process::run_command(&args, self.assembler.timeout()).await {
            Ok(out) => out.success,
            Err(e) => {
                tracing::warn!("{}: assembler did not run: {:#}", ctx.job, e);
                false
            }
        }
    }
}
