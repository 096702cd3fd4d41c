//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::infra::terraform::DEFAULT_TERRAFORM_BIN;

/// Configure, deploy, destroy and inspect ephemeral platform deployments
#[derive(Parser)]
#[command(
    name = "platform-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Directory holding templates and the defaults-local/defaults-cloud files
    #[arg(long, global = true, env = "OT_TEMPLATES_DIR", default_value = "etc")]
    pub templates: PathBuf,

    /// Provisioning tool binary
    #[arg(long, global = true, env = "OT_TERRAFORM_BIN", default_value = DEFAULT_TERRAFORM_BIN)]
    pub terraform: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or update a deployment
    #[command(subcommand)]
    Deploy(commands::deploy::DeployCommand),

    /// Tear down a deployment by directory or gs:// record
    Destroy(commands::destroy::DestroyArgs),

    /// List cloud deployments and probe their health
    List(commands::list::ListArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            templates,
            terraform,
            command,
        } = self;
        let unattended = match &command {
            Command::Deploy(cmd) => cmd.unattended(),
            Command::Destroy(_) | Command::List(_) => true,
        };
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
            unattended,
            templates,
            terraform,
        });
        match command {
            Command::Deploy(cmd) => commands::deploy::run(&app, cmd).await,
            Command::Destroy(args) => commands::destroy::run(&app, &args).await,
            Command::List(args) => commands::list::run(&app, &args).await,
        }
    }
}
