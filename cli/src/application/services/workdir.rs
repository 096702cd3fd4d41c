//! Application service: deployment directory management.
//!
//! A deployment directory is named after the deployment identity and holds
//! the persisted `config`, secret files, static templates and (cloud)
//! provisioning logs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;
use crate::domain::deployment::{CONFIG_FILE, DeploymentConfig, DeploymentKind};

/// Mode of the persisted `config` file.
pub const CONFIG_MODE: u32 = 0o640;

/// Mode of secret files.
pub const SECRET_MODE: u32 = 0o600;

/// Templates a local deployment needs.
pub const LOCAL_TEMPLATES: &[&str] = &["compose.yaml", "Dockerfile-opensearch"];

/// Templates a cloud deployment needs.
pub const CLOUD_TEMPLATES: &[&str] = &[
    "cleanup.sh.tftpl",
    "compose.yaml",
    "config-watcher.service",
    "config-watcher.sh",
    "Dockerfile-opensearch",
    "google-startup-script.sh",
    "main.tf",
    "nginx.conf.tftpl",
];

#[must_use]
pub fn templates_for(kind: DeploymentKind) -> &'static [&'static str] {
    match kind {
        DeploymentKind::Local => LOCAL_TEMPLATES,
        DeploymentKind::Cloud => CLOUD_TEMPLATES,
    }
}

/// Create `path` recursively. Existing directories are fine.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_directory(fs: &impl LocalFs, path: &Path) -> Result<()> {
    if fs.exists(path) {
        return Ok(());
    }
    fs.create_dir_all(path)?;
    tracing::debug!(path = %path.display(), "created deployment directory");
    Ok(())
}

/// Ensure the deployment directory and copy the variant's templates into it,
/// overwriting existing copies.
///
/// # Errors
///
/// Returns an error if a template is missing or cannot be copied.
pub fn prepare_templates(
    fs: &impl LocalFs,
    config: &DeploymentConfig,
    templates_dir: &Path,
) -> Result<PathBuf> {
    let dir = config.deployment_directory();
    ensure_directory(fs, &dir)?;
    for name in templates_for(config.kind()) {
        let from = templates_dir.join(name);
        let to = dir.join(name);
        fs.copy_file(&from, &to)
            .with_context(|| format!("copying template {name}"))?;
    }
    Ok(dir)
}

/// Write `config` and every secret file into the deployment directory.
///
/// # Errors
///
/// Returns an error on the first failed write.
pub fn persist(fs: &impl LocalFs, config: &DeploymentConfig) -> Result<PathBuf> {
    let dir = config.deployment_directory();
    ensure_directory(fs, &dir)?;

    let config_path = dir.join(CONFIG_FILE);
    fs.write(&config_path, config.serialize())?;
    fs.set_permissions(&config_path, CONFIG_MODE)?;

    for setting in config.secret_fields() {
        let Some(file) = setting.secret else { continue };
        let path = dir.join(file);
        // Restrict before the value lands.
        fs.write(&path, String::new())?;
        fs.set_permissions(&path, SECRET_MODE)?;
        fs.write(&path, setting.value.clone())?;
    }
    tracing::info!(path = %config_path.display(), "configuration persisted");
    Ok(dir)
}
