//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::domain::{DeploymentConfig, ProbeReport, ProbeStatus};
use crate::output::OutputContext;

const SECRET_MASK: &str = "********";

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render a configuration group by group. Secret values are masked.
    pub fn render_config(&self, config: &DeploymentConfig) {
        if self.ctx.quiet {
            return;
        }
        let settings = config.settings();
        let width = settings.iter().map(|s| s.title.len()).max().unwrap_or(0) + 1;
        println!();
        self.ctx.header(&format!(
            "{} deployment {}",
            config.kind(),
            config.identity()
        ));
        for group in settings.groups() {
            println!();
            println!("  {}", group.style(self.ctx.styles.group));
            for s in settings.iter().filter(|s| s.group == group) {
                let value = if s.is_secret() && !s.value.is_empty() {
                    SECRET_MASK
                } else {
                    s.value.as_str()
                };
                let key = format!("{}:", s.title);
                println!("    {}  {value}", format!("{key:<width$}").style(self.ctx.styles.dim));
            }
        }
        println!();
    }

    /// Render a fleet listing, one line per deployment.
    pub fn render_fleet(&self, reports: &[ProbeReport]) {
        if reports.is_empty() {
            println!("No deployments found.");
            return;
        }
        for r in reports {
            println!("{}", self.fleet_line(r));
        }
    }

    /// `✔ — name — url` when live, `✘ — name — status` otherwise.
    #[must_use]
    pub fn fleet_line(&self, report: &ProbeReport) -> String {
        match (&report.status, report.url.as_deref()) {
            (ProbeStatus::Live, Some(url)) => format!(
                "{} — {} — {url}",
                "✔".style(self.ctx.styles.success),
                report.name
            ),
            (status, _) => format!(
                "{} — {} — {}",
                "✘".style(self.ctx.styles.error),
                report.name,
                self.status_label(status)
            ),
        }
    }

    fn status_label(&self, status: &ProbeStatus) -> String {
        let label = status.to_string();
        let style = match status {
            ProbeStatus::Live => self.ctx.styles.success,
            ProbeStatus::HttpStatus(_) | ProbeStatus::UnknownResponse => self.ctx.styles.warning,
            _ => self.ctx.styles.error,
        };
        label.style(style).to_string()
    }
}
