//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries the output context, template location, provisioning
//! binary and interaction mode so command signatures stay stable when a
//! cross-cutting flag is added.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::DeploymentKind;
use crate::output::human::HumanRenderer;
use crate::output::{OutputContext, TerminalReporter};

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Skip interactive prompts.
    pub unattended: bool,
    /// Templates and defaults directory.
    pub templates: PathBuf,
    /// Provisioning tool binary.
    pub terraform: String,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Source of static templates and built-in defaults.
    pub templates: PathBuf,
    /// Provisioning tool binary.
    pub terraform: String,
    /// When `true`, never prompt.
    ///
    /// Set when `--unattended` is passed or when `CI` is present in the
    /// environment.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok();
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet, flags.json),
            templates: flags.templates.clone(),
            terraform: flags.terraform.clone(),
            non_interactive: flags.unattended || ci_env,
        }
    }

    /// Built-in defaults file for `kind`.
    #[must_use]
    pub fn defaults_file(&self, kind: DeploymentKind) -> PathBuf {
        self.templates.join(format!("defaults-{kind}"))
    }

    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true`, returns `default` immediately
    /// without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("confirmation prompt")
    }
}
