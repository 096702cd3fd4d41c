//! `platform-deploy list <backend>`: cloud deployments and their health.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter as _;
use crate::application::services::fleet;
use crate::domain::StorageUri;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::google::GoogleCloud;
use crate::infra::health::HttpHealthCheck;
use crate::output::json;

#[derive(Args)]
pub struct ListArgs {
    /// gs:// location the deployment records are stored under
    pub backend: String,
}

/// Run `platform-deploy list <backend>`.
///
/// # Errors
///
/// Returns an error if the backend reference is invalid or cannot be
/// listed. Unreachable deployments are reported, not raised.
pub async fn run(app: &AppContext, args: &ListArgs) -> Result<()> {
    let backend = StorageUri::parse(&args.backend)?;
    let google = GoogleCloud::new(TokioCommandRunner::default())?;
    let health = HttpHealthCheck::new()?;

    let reports = {
        let reporter = app.reporter();
        let reports = fleet::list_and_probe(&backend, &google, &health, &reporter).await?;
        let live = reports.iter().filter(|r| r.status.is_live()).count();
        reporter.success(&format!("{} deployments, {live} live", reports.len()));
        reports
    };

    if app.output.json {
        println!("{}", json::format_reports(&reports)?);
    } else {
        app.renderer().render_fleet(&reports);
    }
    Ok(())
}
