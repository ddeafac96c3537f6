use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Downloader invocation settings (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Program taking `-l <list> -o <outdir> -a <credentials>`.
    pub program: String,
    /// Value passed to `--downloadLibrariesType`.
    pub library_type: String,
    /// Kill the downloader after this many seconds (None = no limit).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "getSeqENA.py".to_string(),
            library_type: "PE".to_string(),
            timeout_secs: None,
        }
    }
}

impl DownloaderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Assembly pipeline invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    pub program: String,
    /// Organism label passed with `-s`.
    pub organism: String,
    /// Reference genome size passed with `-g`.
    pub genome_size: String,
    /// Fixed feature flags appended after the thread count.
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            program: "INNUca.py".to_string(),
            organism: "Campylobacter jejuni".to_string(),
            genome_size: "1.6".to_string(),
            extra_args: vec![
                "--spadesSaveReport".to_string(),
                "--pilonKeepSPAdesAssembly".to_string(),
            ],
            timeout_secs: None,
        }
    }
}

impl AssemblerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// How a found version is compared against the required one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionOp {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "==")]
    Exactly,
}

impl VersionOp {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionOp::AtLeast => ">=",
            VersionOp::Exactly => "==",
        }
    }
}

/// One external program the run cannot start without.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredProgram {
    pub program: String,
    /// Flag that makes the program print its version (e.g. `--version`).
    pub version_flag: String,
    pub op: VersionOp,
    pub version: String,
}

impl RequiredProgram {
    fn at_least(program: &str, version_flag: &str, version: &str) -> Self {
        Self {
            program: program.to_string(),
            version_flag: version_flag.to_string(),
            op: VersionOp::AtLeast,
            version: version.to_string(),
        }
    }
}

fn default_dependencies() -> Vec<RequiredProgram> {
    vec![
        RequiredProgram::at_least("getSeqENA.py", "--version", "0.4"),
        RequiredProgram::at_least("ascp", "--version", "3.6.1"),
        RequiredProgram::at_least("INNUca.py", "--version", "1.6"),
        RequiredProgram::at_least("gunzip", "--version", "1.6"),
        RequiredProgram::at_least("java", "-version", "1.8"),
        RequiredProgram::at_least("mlst", "--version", "2.4"),
    ]
}

fn default_true() -> bool {
    true
}

/// Global configuration loaded from `~/.config/seqbatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeqbatchConfig {
    #[serde(default = "default_true")]
    pub check_dependencies: bool,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub assembler: AssemblerConfig,
    /// Programs probed with `which` and a version flag before any work starts.
    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<RequiredProgram>,
}

impl Default for SeqbatchConfig {
    fn default() -> Self {
        Self {
            check_dependencies: true,
            downloader: DownloaderConfig::default(),
            assembler: AssemblerConfig::default(),
            dependencies: default_dependencies(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("seqbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SeqbatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SeqbatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (e.g. `--config`).
pub fn load_from_path(path: &Path) -> Result<SeqbatchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SeqbatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
