//! `platform-deploy destroy <target>`: tear a deployment down.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::deploy;
use crate::application::services::destroy::{self, DestroyTarget};
use crate::application::services::workdir;
use crate::domain::DeploymentConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::compose::DockerCompose;
use crate::infra::fs::LocalFs;
use crate::infra::google::GoogleCloud;
use crate::infra::terraform::{RunLog, TerraformCli};

#[derive(Args)]
pub struct DestroyArgs {
    /// Deployment directory or gs://bucket/object deployment record
    pub target: String,
}

/// Run `platform-deploy destroy <target>`.
///
/// # Errors
///
/// Returns an error if the target's type is unknown, its config cannot be
/// read, or the teardown fails.
pub async fn run(app: &AppContext, args: &DestroyArgs) -> Result<()> {
    let runner = TokioCommandRunner::default();
    let google = GoogleCloud::new(runner)?;
    let reporter = app.reporter();

    match destroy::resolve_target(&args.target, &LocalFs, &google).await? {
        DestroyTarget::Local(dir) => {
            let compose = DockerCompose::new(runner, Vec::new());
            deploy::destroy_local(&compose, &reporter, &dir).await
        }
        DestroyTarget::Cloud(cloud) => {
            let config = DeploymentConfig::Cloud(cloud.clone());
            let dir = workdir::prepare_templates(&LocalFs, &config, &app.templates)?;
            let tf = TerraformCli::new(
                runner,
                app.terraform.as_str(),
                dir.clone(),
                deploy::provisioning_env(&cloud)?,
                RunLog::create(&dir)?,
            );
            tf.verify().await?;
            deploy::destroy_cloud(&tf, &reporter, &cloud).await?;
            Ok(())
        }
    }
}
