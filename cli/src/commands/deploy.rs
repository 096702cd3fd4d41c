//! `platform-deploy deploy local|cloud`: resolve, validate, materialize and
//! run a deployment.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter as _;
use crate::application::services::deploy::{self, LocalDeployment};
use crate::application::services::resolver::{self, ConfigSource, LoadRequest};
use crate::application::services::validation::{self, ReportingChecker};
use crate::application::services::workdir;
use crate::commands::form;
use crate::domain::{DeploymentConfig, DeploymentKind};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::compose::DockerCompose;
use crate::infra::env::ProcessEnv;
use crate::infra::fetch::HttpFetcher;
use crate::infra::fs::LocalFs;
use crate::infra::google::GoogleCloud;
use crate::infra::terraform::{RunLog, TerraformCli};

#[derive(Subcommand)]
pub enum DeployCommand {
    /// Run the stack on this machine with docker compose
    Local(LocalArgs),
    /// Provision the stack on Google Cloud
    Cloud(CloudArgs),
}

/// Options shared by every deployment kind.
#[derive(Args)]
pub struct SourceArgs {
    /// Config file path or gs://bucket/object URI
    #[arg(long)]
    pub config: Option<String>,

    /// Validate and deploy without prompting
    #[arg(long)]
    pub unattended: bool,
}

#[derive(Args)]
pub struct LocalArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Cache directory for data archives
    #[arg(long, env = "OT_DOWNLOADS_DIR", default_value = "downloads")]
    pub downloads: PathBuf,
}

#[derive(Args)]
pub struct CloudArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl DeployCommand {
    #[must_use]
    pub fn kind(&self) -> DeploymentKind {
        match self {
            Self::Local(_) => DeploymentKind::Local,
            Self::Cloud(_) => DeploymentKind::Cloud,
        }
    }

    fn source(&self) -> &SourceArgs {
        match self {
            Self::Local(args) => &args.source,
            Self::Cloud(args) => &args.source,
        }
    }

    #[must_use]
    pub fn unattended(&self) -> bool {
        self.source().unattended
    }
}

/// Run `platform-deploy deploy <kind>`.
///
/// # Errors
///
/// Returns an error on a config type problem, any invalid setting in
/// unattended mode, an I/O failure while materializing the directory, or
/// any failed provisioning step.
pub async fn run(app: &AppContext, cmd: DeployCommand) -> Result<()> {
    let kind = cmd.kind();
    let source = cmd.source().config.as_deref().map(ConfigSource::parse).transpose()?;
    let runner = TokioCommandRunner::default();
    let google = GoogleCloud::new(runner)?;

    let defaults = app.defaults_file(kind);
    let mut config = resolver::load(
        &LoadRequest {
            defaults: &defaults,
            source: source.as_ref(),
            wanted: kind,
        },
        &LocalFs,
        &google,
        &ProcessEnv,
    )
    .await?;

    let reporter = app.reporter();
    if app.non_interactive {
        let checker = ReportingChecker::new(&google, &reporter);
        validation::validate_all(&mut config, &checker).await?;
        reporter.success("configuration is valid");
    } else {
        form::edit(app, &mut config, &google).await?;
    }

    let dir = workdir::prepare_templates(&LocalFs, &config, &app.templates)?;
    workdir::persist(&LocalFs, &config)?;
    tracing::info!(dir = %dir.display(), "deployment directory ready");

    match (&config, cmd) {
        (DeploymentConfig::Local(local), DeployCommand::Local(args)) => {
            let compose = DockerCompose::new(runner, config.env_pairs());
            deploy::deploy_local(
                &HttpFetcher::new()?,
                &compose,
                &LocalFs,
                &reporter,
                &LocalDeployment {
                    config: local,
                    deployment_dir: &dir,
                    downloads: &args.downloads,
                },
            )
            .await
        }
        (DeploymentConfig::Cloud(cloud), DeployCommand::Cloud(_)) => {
            let tf = TerraformCli::new(
                runner,
                app.terraform.as_str(),
                dir.clone(),
                deploy::provisioning_env(cloud)?,
                RunLog::create(&dir)?,
            );
            tf.verify().await?;
            deploy::deploy_cloud(&tf, &reporter, cloud).await?;
            deploy::publish_record(&google, &reporter, cloud).await;
            Ok(())
        }
        _ => anyhow::bail!("resolved configuration is not a {kind} deployment"),
    }
}
