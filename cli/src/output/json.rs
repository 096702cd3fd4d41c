//! JSON output helpers.
//!
//! The error object used by every `--json` code path when a command fails,
//! and the fleet listing document.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::ProbeReport;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

#[derive(Debug, Serialize)]
struct DeploymentEntry<'a> {
    name: &'a str,
    url: Option<&'a str>,
    status: String,
}

/// Format probe reports as an array of `{name, url, status}`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_reports(reports: &[ProbeReport]) -> Result<String> {
    let deployments: Vec<DeploymentEntry<'_>> = reports
        .iter()
        .map(|r| DeploymentEntry {
            name: &r.name,
            url: r.url.as_deref(),
            status: r.status.to_string(),
        })
        .collect();
    serde_json::to_string_pretty(&deployments).context("JSON serialization failed")
}
