//! `ComposeDriver` adapter running `docker compose`.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ComposeDriver, ExecContext, UpOptions};
use crate::domain::error::ProvisioningError;
use crate::infra::command_runner::LONG_CMD_TIMEOUT;

/// Build `docker compose ... up` arguments.
#[must_use]
pub fn up_args(compose_file: &str, opts: UpOptions) -> Vec<&str> {
    let mut args = vec![
        "compose",
        "--file",
        compose_file,
        "up",
        "-d",
        "--quiet-build",
        "--quiet-pull",
    ];
    if opts.build {
        args.push("--build");
    }
    if opts.force_recreate {
        args.push("--force-recreate");
    }
    args
}

/// `docker compose` with the deployment settings in its environment.
pub struct DockerCompose<R: CommandRunner> {
    runner: R,
    envs: Vec<(String, String)>,
}

impl<R: CommandRunner> DockerCompose<R> {
    #[must_use]
    pub fn new(runner: R, envs: Vec<(String, String)>) -> Self {
        Self { runner, envs }
    }

    async fn docker(&self, action: &'static str, args: &[&str]) -> Result<()> {
        let ctx = ExecContext {
            cwd: None,
            envs: &self.envs,
            timeout: Some(LONG_CMD_TIMEOUT),
        };
        let out = self.runner.run_in("docker", args, &ctx).await?;
        if !out.status.success() {
            return Err(ProvisioningError::Compose {
                action,
                detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl<R: CommandRunner> ComposeDriver for DockerCompose<R> {
    async fn up(&self, compose_file: &Path, opts: UpOptions) -> Result<()> {
        let file = compose_file.to_string_lossy();
        self.docker("up", &up_args(&file, opts)).await
    }

    async fn down(&self, compose_file: &Path) -> Result<()> {
        let file = compose_file.to_string_lossy();
        self.docker("down", &["compose", "--file", &file, "down"])
            .await
    }
}
