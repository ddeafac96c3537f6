//! Stand-in downloader and assembler scripts for end-to-end tests.
//!
//! The downloader creates `<outdir>/<id>/` with a compressed reads file and
//! leaves a tier-level log behind. Ids containing `FAIL_DL` make it exit 1.
//! The assembler writes its results into the nested `<dir>/<id>/` directory,
//! drops a log and a CPU scratch file, and records the thread count. Ids
//! containing `FAIL_AS` make it exit 2.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use seqbatch_core::config::SeqbatchConfig;

const DOWNLOADER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -l) list="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
id=$(head -n 1 "$list")
echo "downloading $id" >> "$out/getSeqENA.log"
case "$id" in
  *FAIL_DL*) echo "no such run $id" >&2; exit 1 ;;
esac
mkdir -p "$out/$id"
echo reads > "$out/$id/${id}_1.fastq.gz"
echo reads > "$out/$id/${id}_2.fastq.gz"
"#;

const ASSEMBLER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    -j) threads="$2"; shift 2 ;;
    *) shift ;;
  esac
done
sample=$(basename "$in")
touch "$in/assembler_called"
echo "assembling" > "$in/run.$sample.log"
echo cpu > "$in/$sample.cpu.txt"
case "$sample" in
  *FAIL_AS*) echo "assembly failed" >&2; exit 2 ;;
esac
mkdir -p "$in/$sample"
printf '>contig1\nACGT\n' > "$in/$sample/$sample.contigs.fasta"
echo "$threads" > "$in/$sample/threads.txt"
"#;

pub struct FakeTools {
    pub downloader: PathBuf,
    pub assembler: PathBuf,
    pub credentials: PathBuf,
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Installs the fake tools under `dir`.
pub fn install(dir: &Path) -> FakeTools {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let downloader = bin.join("fake-download");
    let assembler = bin.join("fake-assemble");
    write_script(&downloader, DOWNLOADER);
    write_script(&assembler, ASSEMBLER);
    let credentials = dir.join("asperaweb_id_dsa.openssh");
    fs::write(&credentials, b"key").unwrap();
    FakeTools {
        downloader,
        assembler,
        credentials,
    }
}

impl FakeTools {
    /// Config pointing both steps at the fake scripts.
    pub fn config(&self) -> SeqbatchConfig {
        let mut cfg = SeqbatchConfig::default();
        cfg.downloader.program = self.downloader.to_string_lossy().into_owned();
        cfg.assembler.program = self.assembler.to_string_lossy().into_owned();
        cfg.check_dependencies = false;
        cfg
    }
}
