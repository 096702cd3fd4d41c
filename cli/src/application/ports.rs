//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::domain::{BackendConfig, ProbeStatus, RemoteResource, StorageUri};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Working directory, extra environment and timeout for one child process.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext<'a> {
    pub cwd: Option<&'a Path>,
    pub envs: &'a [(String, String)],
    /// `None` waits for the child however long it runs.
    pub timeout: Option<Duration>,
}

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program in a given directory with extra environment variables.
    async fn run_in(&self, program: &str, args: &[&str], ctx: &ExecContext<'_>)
    -> Result<Output>;
    /// Run a program with stdout and stderr appended to `log` as they are
    /// produced. Whatever the child wrote stays in `log` even when the run
    /// fails or is cut short.
    ///
    /// # Errors
    ///
    /// Returns an error if `log` cannot be opened, the process cannot be
    /// spawned, or it exceeds `ctx.timeout`.
    async fn run_logged(
        &self,
        program: &str,
        args: &[&str],
        ctx: &ExecContext<'_>,
        log: &Path,
    ) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Provisioning Ports ────────────────────────────────────────────────────────

/// Infrastructure-as-code executor, bound to one deployment directory.
///
/// Every call blocks until the step finished; output goes to the tool's
/// own log sink, never to the caller.
#[allow(async_fn_in_trait)]
pub trait ProvisioningTool {
    async fn init(&self, backend: &BackendConfig) -> Result<()>;
    async fn workspace_select(&self, name: &str) -> Result<()>;
    async fn workspace_new(&self, name: &str) -> Result<()>;
    async fn apply(&self) -> Result<()>;
    async fn destroy(&self) -> Result<()>;
}

/// Options for bringing a compose project up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpOptions {
    pub force_recreate: bool,
    pub build: bool,
}

/// Container orchestration for local deployments.
#[allow(async_fn_in_trait)]
pub trait ComposeDriver {
    async fn up(&self, compose_file: &Path, opts: UpOptions) -> Result<()>;
    async fn down(&self, compose_file: &Path) -> Result<()>;
}

/// Fetches and unpacks data archives.
#[allow(async_fn_in_trait)]
pub trait ArchiveFetcher {
    /// Download `url` into `dest`. `dest` only appears once complete.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
    /// Unpack a gzipped tarball into `dest`. `dest` only appears once complete.
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

// ── Remote Store and Check Ports ──────────────────────────────────────────────

/// Object store holding deployment records and provisioning state.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn read(&self, uri: &StorageUri) -> Result<Vec<u8>>;
    async fn write(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<()>;
    /// Full object names in `bucket` starting with `prefix`.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}

/// Why a remote existence check failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("not found")]
    NotFound,
    #[error("malformed identifier")]
    Malformed,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Other(String),
}

/// Confirms that a remote resource exists and is reachable.
#[allow(async_fn_in_trait)]
pub trait ResourceChecker {
    async fn check(&self, resource: &RemoteResource) -> Result<(), ResourceError>;
}

/// Application-level liveness check of a deployment. Never fails; every
/// outcome is a status.
#[allow(async_fn_in_trait)]
pub trait HealthCheck {
    async fn probe(&self, root_url: &str) -> ProbeStatus;
}

// ── Filesystem and Environment Ports ──────────────────────────────────────────

/// Abstracts local filesystem operations.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn write(&self, path: &Path, content: String) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Process environment lookup.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
