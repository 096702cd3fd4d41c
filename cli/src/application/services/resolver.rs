//! Application service: configuration resolution.
//!
//! Layers, lowest first: built-in defaults file, explicit config source
//! (local file or object-store URI), process environment. Interactive edits
//! happen afterwards in the form, on top of the returned config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{EnvSource, LocalFs, ObjectStore};
use crate::domain::deployment::{self, DeploymentConfig, DeploymentKind};
use crate::domain::envfile::{self, EnvMap};
use crate::domain::storage::StorageUri;

/// Where an explicit configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Remote(StorageUri),
}

impl ConfigSource {
    /// `gs://` references are remote, anything else is a local path.
    ///
    /// # Errors
    ///
    /// Returns an error for a `gs://` reference without an object.
    pub fn parse(raw: &str) -> Result<Self> {
        if StorageUri::is_remote(raw) {
            Ok(Self::Remote(StorageUri::parse_object(raw)?))
        } else {
            Ok(Self::File(PathBuf::from(raw)))
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(uri) => write!(f, "{uri}"),
        }
    }
}

/// Read a config source into a flat mapping.
///
/// # Errors
///
/// Returns an error if the source cannot be read or is not a valid config.
pub async fn read_source(
    source: &ConfigSource,
    fs: &impl LocalFs,
    store: &impl ObjectStore,
) -> Result<EnvMap> {
    let text = match source {
        ConfigSource::File(path) => fs.read_to_string(path)?,
        ConfigSource::Remote(uri) => {
            let bytes = store
                .read(uri)
                .await
                .with_context(|| format!("reading config from {uri}"))?;
            String::from_utf8(bytes).with_context(|| format!("config at {uri} is not UTF-8"))?
        }
    };
    envfile::parse(&text).with_context(|| format!("parsing config {source}"))
}

/// Inputs for [`load`].
pub struct LoadRequest<'a> {
    /// Built-in defaults file for the wanted kind.
    pub defaults: &'a Path,
    pub source: Option<&'a ConfigSource>,
    pub wanted: DeploymentKind,
}

/// Resolve a deployment config from defaults, source and environment.
///
/// The defaults file is optional when an explicit source is given. The
/// deployment type is checked against the explicit source if there is one,
/// otherwise against the defaults.
///
/// # Errors
///
/// Returns `ConfigError::MissingType`/`TypeMismatch` (wrapped) on a type
/// problem, or an I/O or parse error for unreadable sources.
pub async fn load(
    req: &LoadRequest<'_>,
    fs: &impl LocalFs,
    store: &impl ObjectStore,
    env: &impl EnvSource,
) -> Result<DeploymentConfig> {
    let defaults = if req.source.is_none() || fs.exists(req.defaults) {
        Some(read_source(&ConfigSource::File(req.defaults.to_path_buf()), fs, store).await?)
    } else {
        tracing::debug!(path = %req.defaults.display(), "no defaults file, using source only");
        None
    };

    let mut merged = defaults.unwrap_or_default();
    if let Some(source) = req.source {
        let explicit = read_source(source, fs, store).await?;
        deployment::check_kind(&explicit, req.wanted)?;
        merged.extend(explicit);
    }

    let mut config = DeploymentConfig::from_map(&merged, req.wanted)?;
    apply_environment_overrides(&mut config, env);
    tracing::info!(kind = %req.wanted, identity = config.identity(), "configuration resolved");
    Ok(config)
}

/// Process environment wins over every loaded value.
pub fn apply_environment_overrides(config: &mut DeploymentConfig, env: &impl EnvSource) {
    config.apply_overrides(|name| {
        let value = env.var(name);
        if value.is_some() {
            tracing::debug!(setting = name, "overridden from environment");
        }
        value
    });
}
