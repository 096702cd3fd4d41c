//! `ProvisioningTool` adapter driving the `terraform` CLI.
//!
//! Each step runs inside the deployment directory with the deployment's
//! settings in its environment. Output of every step streams into a
//! timestamped log file in that directory; it never reaches the terminal.
//! Steps have no time limit since provisioning can legitimately take long.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ExecContext, ProvisioningTool};
use crate::domain::BackendConfig;
use crate::domain::error::ProvisioningError;

/// Default provisioning binary.
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Append-only log of one run's provisioning output.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// `terraform-YYYY-MM-DD-HHMMSS.log` inside `dir`, created empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(dir: &Path) -> Result<Self> {
        let name = format!(
            "terraform-{}.log",
            chrono::Local::now().format("%Y-%m-%d-%H%M%S")
        );
        let path = dir.join(name);
        std::fs::File::create(&path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the command line that the following output belongs to.
    fn begin(&self, args: &[&str]) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("opening log file {}", self.path.display()))?;
        writeln!(f, "$ terraform {}", args.join(" "))?;
        Ok(())
    }
}

/// Init arguments for a GCS backend.
#[must_use]
pub fn init_args(backend: &BackendConfig) -> Vec<String> {
    vec![
        "init".into(),
        "-upgrade".into(),
        "-input=false".into(),
        format!("-backend-config=bucket={}", backend.bucket),
        format!("-backend-config=prefix={}", backend.prefix),
    ]
}

/// Terraform CLI bound to one deployment directory.
pub struct TerraformCli<R: CommandRunner> {
    runner: R,
    program: String,
    dir: PathBuf,
    envs: Vec<(String, String)>,
    log: RunLog,
}

impl<R: CommandRunner> TerraformCli<R> {
    #[must_use]
    pub fn new(
        runner: R,
        program: impl Into<String>,
        dir: PathBuf,
        mut envs: Vec<(String, String)>,
        log: RunLog,
    ) -> Self {
        envs.push(("TF_IN_AUTOMATION".into(), "1".into()));
        Self {
            runner,
            program: program.into(),
            dir,
            envs,
            log,
        }
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Check that the binary runs at all.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::ToolUnavailable` if it cannot be executed.
    pub async fn verify(&self) -> Result<()> {
        match self.runner.run(&self.program, &["version"]).await {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(ProvisioningError::ToolUnavailable(format!(
                "{} version exited with {}",
                self.program, out.status
            ))
            .into()),
            Err(e) => Err(ProvisioningError::ToolUnavailable(format!("{e:#}")).into()),
        }
    }

    async fn step(&self, step: &str, args: &[&str]) -> Result<()> {
        let ctx = ExecContext {
            cwd: Some(self.dir.as_path()),
            envs: &self.envs,
            timeout: None,
        };
        self.log.begin(args)?;
        let failed = || ProvisioningError::Step {
            step: step.to_string(),
            log: self.log.path.clone(),
        };
        let status = self
            .runner
            .run_logged(&self.program, args, &ctx, &self.log.path)
            .await
            .map_err(|e| e.context(failed()))?;
        if !status.success() {
            tracing::debug!(step, %status, "terraform step failed");
            return Err(failed().into());
        }
        Ok(())
    }
}

impl<R: CommandRunner> ProvisioningTool for TerraformCli<R> {
    async fn init(&self, backend: &BackendConfig) -> Result<()> {
        let args = init_args(backend);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.step("init", &args).await
    }

    async fn workspace_select(&self, name: &str) -> Result<()> {
        self.step("workspace select", &["workspace", "select", name])
            .await
    }

    async fn workspace_new(&self, name: &str) -> Result<()> {
        self.step("workspace new", &["workspace", "new", name]).await
    }

    async fn apply(&self) -> Result<()> {
        self.step("apply", &["apply", "-auto-approve", "-input=false"])
            .await
    }

    async fn destroy(&self) -> Result<()> {
        self.step("destroy", &["destroy", "-auto-approve", "-input=false"])
            .await
    }
}
