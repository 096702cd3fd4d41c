//! Application service: deciding what a destroy target refers to.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{LocalFs, ObjectStore};
use crate::application::services::resolver::{ConfigSource, read_source};
use crate::domain::deployment::{
    self, CONFIG_FILE, CloudConfig, DEPLOYMENT_TYPE_KEY, DeploymentKind,
};
use crate::domain::envfile::EnvMap;
use crate::domain::error::DestroyError;
use crate::domain::storage::StorageUri;

/// A deployment to tear down.
#[derive(Debug, Clone)]
pub enum DestroyTarget {
    /// Local compose deployment living in this directory.
    Local(PathBuf),
    Cloud(CloudConfig),
}

/// Classify `raw`: a `gs://` reference is a cloud deployment record; a path
/// is a deployment directory whose `config` names the type.
///
/// # Errors
///
/// Returns `DestroyError::UnknownDeploymentType` if the recorded type is
/// missing or unknown, `DestroyError::MissingSetting` if a cloud record
/// lacks its subdomain or ops URI, or an error if the config cannot be read.
pub async fn resolve_target(
    raw: &str,
    fs: &impl LocalFs,
    store: &impl ObjectStore,
) -> Result<DestroyTarget> {
    if StorageUri::is_remote(raw) {
        let map = read_source(&ConfigSource::parse(raw)?, fs, store).await?;
        return cloud_target(&map);
    }

    let dir = PathBuf::from(raw);
    let map = read_source(&ConfigSource::File(dir.join(CONFIG_FILE)), fs, store).await?;
    let tag = map.get(DEPLOYMENT_TYPE_KEY).cloned().unwrap_or_default();
    match DeploymentKind::from_tag(&tag) {
        Some(DeploymentKind::Local) => Ok(DestroyTarget::Local(dir)),
        Some(DeploymentKind::Cloud) => cloud_target(&map),
        None => Err(DestroyError::UnknownDeploymentType(tag).into()),
    }
}

/// A cloud target is rebuilt strictly from its record: a destroy never
/// targets a generated identity.
fn cloud_target(map: &EnvMap) -> Result<DestroyTarget> {
    deployment::check_kind(map, DeploymentKind::Cloud)?;
    Ok(DestroyTarget::Cloud(CloudConfig::from_record(map)?))
}
