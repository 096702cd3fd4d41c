//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::deployment::DeploymentKind;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while turning a configuration source into a `DeploymentConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config file does not contain OT_DEPLOYMENT_TYPE setting")]
    MissingType,

    #[error("config file is for deployment type '{found}', not '{wanted}'")]
    TypeMismatch { found: String, wanted: DeploymentKind },

    #[error("malformed config at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("unknown setting: {0}")]
    UnknownSetting(String),
}

// ── Validation errors ─────────────────────────────────────────────────────────

/// Why a single setting failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationCause {
    #[error("cannot be empty")]
    Empty,

    #[error("'{value}' is too long (max {max} characters)")]
    TooLong { value: String, max: usize },

    #[error("{0}")]
    Format(String),

    /// Remote lookup answered "no such resource". The payload is the
    /// already-quoted label, e.g. `'eu-west9'` or `bucket 'ops'`.
    #[error("{0} does not exist")]
    NotFound(String),

    #[error("{0} is unknown")]
    Malformed(String),

    #[error("{0} is forbidden")]
    PermissionDenied(String),

    /// A dependent rule read an empty companion setting.
    #[error("{0} is not set")]
    DependencyUnset(&'static str),

    #[error("{0}")]
    Remote(String),
}

/// A failed setting, named by its human title.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {field}: {cause}")]
pub struct ValidationError {
    pub field: String,
    pub cause: ValidationCause,
}

impl ValidationError {
    #[must_use]
    pub fn new(title: &str, cause: ValidationCause) -> Self {
        Self {
            field: title.to_lowercase(),
            cause,
        }
    }
}

/// Every failure from one `validate_all` pass, in setting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Field names that failed, in order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad configuration ({} invalid settings):", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Fatal failures while driving the provisioning tool or container runtime.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("provisioning tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("terraform {step} failed, see {}", log.display())]
    Step { step: String, log: PathBuf },

    #[error("docker compose {action} failed:\n{detail}")]
    Compose { action: &'static str, detail: String },

    #[error("fetching {item} data failed: {detail}")]
    Fetch { item: String, detail: String },
}

// ── Destroy errors ────────────────────────────────────────────────────────────

/// Errors raised while deciding how to tear a deployment down.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestroyError {
    #[error("unknown deployment type: '{0}'")]
    UnknownDeploymentType(String),

    /// The recorded config lacks a setting needed to find the deployment.
    #[error("deployment record does not set {0}")]
    MissingSetting(&'static str),
}

// ── Storage URI errors ────────────────────────────────────────────────────────

/// Errors parsing `gs://bucket/path` references.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    #[error("'{0}' must start with 'gs://'")]
    Scheme(String),

    #[error("'{0}' must contain a bucket and an object")]
    MissingObject(String),

    #[error("'{0}' has an empty bucket name")]
    MissingBucket(String),
}
