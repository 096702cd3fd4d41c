//! Application service: deploy and destroy protocols.
//!
//! Cloud deployments drive a [`ProvisioningTool`] through
//! `init → workspace select (or new) → apply → apply → [destroy]`, strictly in
//! order, stopping at the first failure. Local deployments fetch two data
//! archives concurrently and bring the compose project up.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::application::ports::{
    ArchiveFetcher, ComposeDriver, LocalFs, ObjectStore, ProgressReporter, ProvisioningTool,
    UpOptions,
};
use crate::domain::deployment::{CloudConfig, DeploymentConfig, LocalConfig};
use crate::domain::error::ProvisioningError;
use crate::domain::storage::StorageUri;

// ── Cloud protocol ────────────────────────────────────────────────────────────

/// Where a deployment stands in the provisioning protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unprovisioned,
    Initialized,
    WorkspaceSelected,
    Applied,
    Destroyed,
}

/// One pass of the two-pass convergence policy.
///
/// A plan that adds a data volume creates it on the first apply but only
/// attaches it on the next one, so every deploy applies twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPass {
    Provision,
    Converge,
}

impl ApplyPass {
    pub const SEQUENCE: [Self; 2] = [Self::Provision, Self::Converge];

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Provision => "applying infrastructure plan",
            Self::Converge => "converging attached resources",
        }
    }
}

/// Drives one deployment identity through the provisioning protocol.
pub struct Provisioner<'a, T, R> {
    tool: &'a T,
    reporter: &'a R,
    state: ProvisionState,
}

impl<'a, T: ProvisioningTool, R: ProgressReporter> Provisioner<'a, T, R> {
    #[must_use]
    pub fn new(tool: &'a T, reporter: &'a R) -> Self {
        Self {
            tool,
            reporter,
            state: ProvisionState::Unprovisioned,
        }
    }

    #[must_use]
    pub fn state(&self) -> ProvisionState {
        self.state
    }

    /// Initialise the tool against the remote backend. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool's init step fails.
    pub async fn initialize(&mut self, ops_uri: &str) -> Result<()> {
        let backend = StorageUri::parse_object(ops_uri)?.backend();
        self.reporter.step("initializing provisioning backend");
        tracing::info!(bucket = %backend.bucket, prefix = %backend.prefix, "init");
        self.tool.init(&backend).await?;
        self.state = ProvisionState::Initialized;
        Ok(())
    }

    /// Select the workspace named `name`, creating it if selection fails.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `initialize` or if neither select
    /// nor create succeeds.
    pub async fn select_workspace(&mut self, name: &str) -> Result<()> {
        if self.state == ProvisionState::Unprovisioned {
            bail!("workspace selection requires an initialized backend");
        }
        self.reporter.step(&format!("selecting workspace {name}"));
        if let Err(e) = self.tool.workspace_select(name).await {
            tracing::info!(workspace = name, error = %e, "select failed, creating workspace");
            self.tool
                .workspace_new(name)
                .await
                .with_context(|| format!("selecting or creating workspace {name}"))?;
        }
        self.state = ProvisionState::WorkspaceSelected;
        Ok(())
    }

    /// Apply the plan once per [`ApplyPass::SEQUENCE`] entry.
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace is selected or any pass fails.
    pub async fn converge(&mut self) -> Result<()> {
        self.require_workspace("apply")?;
        for pass in ApplyPass::SEQUENCE {
            self.reporter.step(pass.describe());
            tracing::info!(?pass, "apply");
            self.tool.apply().await?;
        }
        self.state = ProvisionState::Applied;
        Ok(())
    }

    /// Destroy everything in the selected workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace is selected or destroy fails.
    pub async fn destroy(&mut self) -> Result<()> {
        self.require_workspace("destroy")?;
        self.reporter.step("destroying infrastructure");
        self.tool.destroy().await?;
        self.state = ProvisionState::Destroyed;
        Ok(())
    }

    fn require_workspace(&self, action: &str) -> Result<()> {
        if matches!(
            self.state,
            ProvisionState::WorkspaceSelected | ProvisionState::Applied
        ) {
            Ok(())
        } else {
            bail!("{action} requires a selected workspace (state: {:?})", self.state)
        }
    }
}

/// Provision a cloud deployment.
///
/// # Errors
///
/// Returns the first failing step; nothing is rolled back.
pub async fn deploy_cloud(
    tool: &impl ProvisioningTool,
    reporter: &impl ProgressReporter,
    config: &CloudConfig,
) -> Result<ProvisionState> {
    let mut p = Provisioner::new(tool, reporter);
    p.initialize(config.ops_uri()).await?;
    p.select_workspace(config.subdomain()).await?;
    p.converge().await?;
    reporter.success(&format!("deployed {}", config.root_url()));
    Ok(p.state())
}

/// Where the deployment record of `config` lives: `<ops uri>/<subdomain>`.
///
/// # Errors
///
/// Returns an error if the ops URI is not a `gs://` object reference.
pub fn record_uri(config: &CloudConfig) -> Result<StorageUri> {
    Ok(StorageUri::parse_object(config.ops_uri())?.join(config.subdomain()))
}

/// Provisioning variable carrying [`record_uri`] to the deployed machine.
pub const RECORD_URI_VAR: &str = "TF_VAR_OT_RECORD_URI";

/// Environment for provisioning runs: every non-secret setting plus the
/// deployment record location.
///
/// # Errors
///
/// Returns an error if the ops URI is not a `gs://` object reference.
pub fn provisioning_env(config: &CloudConfig) -> Result<Vec<(String, String)>> {
    let mut envs = DeploymentConfig::Cloud(config.clone()).env_pairs();
    envs.push((RECORD_URI_VAR.to_string(), record_uri(config)?.to_string()));
    Ok(envs)
}

/// Upload the serialized config as the deployment's record. A failure is
/// reported as a warning; the deployment itself already succeeded.
pub async fn publish_record(
    store: &impl ObjectStore,
    reporter: &impl ProgressReporter,
    config: &CloudConfig,
) -> bool {
    let uri = match record_uri(config) {
        Ok(uri) => uri,
        Err(e) => {
            reporter.warn(&format!("config not uploaded: {e:#}"));
            return false;
        }
    };
    let body = DeploymentConfig::Cloud(config.clone()).serialize();
    match store.write(&uri, body.into_bytes()).await {
        Ok(()) => {
            tracing::info!(%uri, "deployment record uploaded");
            true
        }
        Err(e) => {
            let detail = format!("{e:#}");
            tracing::warn!(%uri, error = %detail, "deployment record upload failed");
            reporter.warn(&format!("config not uploaded to {uri}: {detail}"));
            false
        }
    }
}

/// Tear a cloud deployment down. Init and workspace selection are redone to
/// rebuild the tool's local state.
///
/// # Errors
///
/// Returns the first failing step.
pub async fn destroy_cloud(
    tool: &impl ProvisioningTool,
    reporter: &impl ProgressReporter,
    config: &CloudConfig,
) -> Result<ProvisionState> {
    let mut p = Provisioner::new(tool, reporter);
    p.initialize(config.ops_uri()).await?;
    p.select_workspace(config.subdomain()).await?;
    p.destroy().await?;
    reporter.success(&format!("destroyed cloud deployment {}", config.subdomain()));
    Ok(p.state())
}

// ── Local protocol ────────────────────────────────────────────────────────────

/// Data archives every local deployment needs.
pub const DATA_ARCHIVES: [&str; 2] = ["clickhouse", "opensearch"];

/// Compose definition file name inside a deployment directory.
pub const COMPOSE_FILE: &str = "compose.yaml";

/// One archive to download and unpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArchive {
    pub name: &'static str,
    pub url: String,
    pub archive: PathBuf,
    pub target: PathBuf,
}

/// Archive locations for `config`'s release.
#[must_use]
pub fn data_archives(
    config: &LocalConfig,
    downloads: &Path,
    deployment_dir: &Path,
) -> [DataArchive; 2] {
    let release = config.release();
    DATA_ARCHIVES.map(|name| DataArchive {
        name,
        url: format!(
            "{}/{release}/disk_images/{name}.tgz",
            config.release_url()
        ),
        archive: downloads.join(format!("{name}-{release}.tgz")),
        target: deployment_dir.join(name),
    })
}

async fn download_one(
    fetcher: &impl ArchiveFetcher,
    fs: &impl LocalFs,
    item: &DataArchive,
) -> Result<()> {
    if fs.exists(&item.archive) {
        tracing::info!(archive = %item.archive.display(), "download skipped, archive cached");
        return Ok(());
    }
    fetcher
        .download(&item.url, &item.archive)
        .await
        .map_err(|e| fetch_error(item, "download", &e))
}

async fn extract_one(
    fetcher: &impl ArchiveFetcher,
    fs: &impl LocalFs,
    item: &DataArchive,
) -> Result<()> {
    if fs.exists(&item.target) {
        tracing::info!(target = %item.target.display(), "extraction skipped, data present");
        return Ok(());
    }
    fetcher
        .extract(&item.archive, &item.target)
        .await
        .map_err(|e| fetch_error(item, "extract", &e))
}

fn fetch_error(item: &DataArchive, stage: &str, err: &anyhow::Error) -> anyhow::Error {
    ProvisioningError::Fetch {
        item: item.name.to_string(),
        detail: format!("{stage}: {err:#}"),
    }
    .into()
}

/// Keep the first error, log the rest.
fn first_error(results: [Result<()>; 2]) -> Result<()> {
    let mut first = None;
    for err in results.into_iter().filter_map(Result::err) {
        if first.is_none() {
            first = Some(err);
        } else {
            let detail = format!("{err:#}");
            tracing::warn!(error = %detail, "additional data fetch failure");
        }
    }
    first.map_or(Ok(()), Err)
}

/// Download both archives, then extract both. Either stage's first
/// failure aborts the run before anything else starts.
///
/// # Errors
///
/// Returns the first download or extraction failure.
pub async fn fetch_data(
    fetcher: &impl ArchiveFetcher,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    archives: &[DataArchive; 2],
) -> Result<()> {
    let [a, b] = archives;
    if let Some(parent) = a.archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)?;
    }

    reporter.step("downloading data, this may take a while");
    let (ra, rb) = tokio::join!(download_one(fetcher, fs, a), download_one(fetcher, fs, b));
    first_error([ra, rb])?;

    reporter.step("extracting data, this may take a while");
    let (ra, rb) = tokio::join!(extract_one(fetcher, fs, a), extract_one(fetcher, fs, b));
    first_error([ra, rb])
}

/// Inputs for [`deploy_local`].
pub struct LocalDeployment<'a> {
    pub config: &'a LocalConfig,
    pub deployment_dir: &'a Path,
    pub downloads: &'a Path,
}

/// Fetch data and start the compose project with a forced rebuild.
///
/// # Errors
///
/// Returns an error if fetching data or compose fails.
pub async fn deploy_local(
    fetcher: &impl ArchiveFetcher,
    compose: &impl ComposeDriver,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    req: &LocalDeployment<'_>,
) -> Result<()> {
    let archives = data_archives(req.config, req.downloads, req.deployment_dir);
    fetch_data(fetcher, fs, reporter, &archives).await?;

    reporter.step("starting local deployment");
    compose
        .up(
            &req.deployment_dir.join(COMPOSE_FILE),
            UpOptions {
                force_recreate: true,
                build: true,
            },
        )
        .await?;
    reporter.success("local deployment started");
    Ok(())
}

/// Stop a local deployment's compose project.
///
/// # Errors
///
/// Returns an error if compose fails.
pub async fn destroy_local(
    compose: &impl ComposeDriver,
    reporter: &impl ProgressReporter,
    deployment_dir: &Path,
) -> Result<()> {
    reporter.step("stopping local deployment");
    compose.down(&deployment_dir.join(COMPOSE_FILE)).await?;
    reporter.success(&format!(
        "local deployment {} destroyed",
        deployment_dir.display()
    ));
    Ok(())
}
