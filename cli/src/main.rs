//! platform-deploy - ephemeral platform deployments

use clap::Parser;
use tracing_subscriber::EnvFilter;

use platform_deploy::cli::Cli;
use platform_deploy::output::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_errors = cli.json;
    if let Err(e) = cli.run().await {
        let message = format!("{e:#}");
        match json_errors.then(|| json::format_error(&message, "command_failed")) {
            Some(Ok(body)) => println!("{body}"),
            _ => eprintln!("Error: {message}"),
        }
        std::process::exit(1);
    }
}
