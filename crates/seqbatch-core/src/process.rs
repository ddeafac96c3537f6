//! External command runner.
//!
//! Spawns a program without a shell, drains stdout and stderr concurrently,
//! and optionally kills the child on timeout. On Unix the child leads its own
//! process group, so a timeout also kills whatever it forked. A nonzero exit is a normal
//! result (`success == false`), not an error; only spawn/wait failures are `Err`.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// How long pipe readers may keep running after a timed-out child was killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// True iff the process exited with code zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// True if the process was killed because the timeout expired.
    pub timed_out: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut r) = reader {
        r.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Waits for a pipe reader. With `grace`, a reader still blocked after that long
/// (a descendant escaped the group and holds the pipe) is aborted.
async fn join_drain(
    mut task: JoinHandle<std::io::Result<Vec<u8>>>,
    grace: Option<Duration>,
    stream: &str,
) -> Result<Vec<u8>> {
    let joined = match grace {
        None => task.await,
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                tracing::warn!("{} still held open after kill, output dropped", stream);
                return Ok(Vec::new());
            }
        },
    };
    let bytes = joined.with_context(|| format!("{} reader join", stream))??;
    Ok(bytes)
}

/// Kills the child and every process in its group.
async fn kill_tree(child: &mut Child) -> Result<()> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let r = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if r != 0 {
                tracing::debug!(
                    pid,
                    error = %std::io::Error::last_os_error(),
                    "killpg failed, killing child only"
                );
            }
        }
    }
    child.kill().await.context("kill timed-out child")
}

/// Human-readable command line for logs.
pub fn display_command<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs `args[0]` with `args[1..]`, capturing all output.
///
/// Logs `Running: <cmd>` before execution and dumps STDOUT/STDERR when the
/// command does not succeed. With `timeout`, an overrunning child is killed and
/// whatever output it produced so far is still returned.
pub async fn run_command<S: AsRef<OsStr>>(
    args: &[S],
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("empty command"))?;
    let cmd_line = display_command(args);
    tracing::info!("Running: {}", cmd_line);

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn: {}", cmd_line))?;

    let stdout_task = tokio::spawn(drain(child.stdout.take()));
    let stderr_task = tokio::spawn(drain(child.stderr.take()));

    let (status, timed_out) = match timeout {
        None => (Some(child.wait().await.context("wait for child")?), false),
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => (Some(status.context("wait for child")?), false),
            Err(_) => {
                tracing::warn!(timeout_secs = limit.as_secs_f64(), "timed out, killing: {}", cmd_line);
                kill_tree(&mut child).await?;
                (None, true)
            }
        },
    };

    let grace = timed_out.then_some(DRAIN_GRACE);
    let stdout = join_drain(stdout_task, grace, "stdout").await?;
    let stderr = join_drain(stderr_task, grace, "stderr").await?;

    let code = status.and_then(|s| s.code());
    let out = CommandOutput {
        success: status.map(|s| s.success()).unwrap_or(false),
        code,
        timed_out,
        stdout,
        stderr,
    };

    if !out.success {
        tracing::warn!(
            "command failed (code {:?}): {}\nSTDOUT\n{}\nSTDERR\n{}",
            out.code,
            cmd_line,
            out.stdout_lossy(),
            out.stderr_lossy()
        );
    }

    Ok(out)
}
