//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill on all platforms.

use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::application::ports::{CommandRunner, ExecContext};

/// Default timeout for short tool invocations (`docker manifest inspect`,
/// `gcloud auth print-access-token`).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for compose steps, which may pull or build images. Provisioning
/// steps run without one.
pub const LONG_CMD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Production `CommandRunner`: uses tokio for async process execution
/// with guaranteed timeout and kill on all platforms.
///
/// On Windows, `tokio::time::timeout` around `.output().await` does NOT kill
/// the child process when the timeout fires: the future is dropped but the
/// OS process keeps running. This implementation uses `tokio::select!` with
/// explicit `child.kill()` to guarantee the process is terminated.
#[derive(Debug, Clone, Copy)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

fn spawn(mut cmd: Command, program: &str) -> Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

/// Resolves after `timeout`, or never when there is none.
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending::<()>().await,
    }
}

fn timed_out(program: &str, timeout: Option<Duration>) -> anyhow::Error {
    let secs = timeout.map_or(0, |t| t.as_secs());
    anyhow::anyhow!("{program} timed out after {secs}s")
}

async fn collect(mut child: Child, program: &str, timeout: Option<Duration>) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            Ok(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        } => result,
        () = expire(timeout) => {
            let _ = child.kill().await;
            Err(timed_out(program, timeout))
        }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        collect(spawn(cmd, program)?, program, Some(timeout)).await
    }

    async fn run_in(
        &self,
        program: &str,
        args: &[&str],
        ctx: &ExecContext<'_>,
    ) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(ctx.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = ctx.cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(program, ?args, cwd = ?ctx.cwd, "running");
        collect(spawn(cmd, program)?, program, ctx.timeout).await
    }

    async fn run_logged(
        &self,
        program: &str,
        args: &[&str],
        ctx: &ExecContext<'_>,
        log: &Path,
    ) -> Result<ExitStatus> {
        let out = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(log)
            .with_context(|| format!("opening log file {}", log.display()))?;
        let err = out
            .try_clone()
            .with_context(|| format!("opening log file {}", log.display()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(ctx.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .kill_on_drop(true);
        if let Some(dir) = ctx.cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(program, ?args, cwd = ?ctx.cwd, log = %log.display(), "running");
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        tokio::select! {
            status = child.wait() => status.with_context(|| format!("waiting for {program}")),
            () = expire(ctx.timeout) => {
                let _ = child.kill().await;
                Err(timed_out(program, ctx.timeout))
            }
        }
    }
}
