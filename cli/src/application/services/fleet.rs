//! Application service: listing cloud deployments and probing their health.
//!
//! Probing never fails: unreadable records and unreachable hosts become a
//! status on the returned report.

use anyhow::Result;

use crate::application::ports::{HealthCheck, ObjectStore, ProgressReporter};
use crate::domain::envfile;
use crate::domain::fleet::{self, ProbeReport, ProbeStatus, RemoteDeploymentRecord};
use crate::domain::storage::StorageUri;

/// Deployment records under `backend`.
///
/// # Errors
///
/// Returns an error if `backend` is not a `gs://` reference or the listing
/// fails.
pub async fn list(
    backend: &StorageUri,
    store: &impl ObjectStore,
) -> Result<Vec<RemoteDeploymentRecord>> {
    let prefix = if backend.path.is_empty() {
        String::new()
    } else {
        format!("{}/", backend.path)
    };
    let names = store.list(&backend.bucket, &prefix).await?;
    let records = fleet::records_from_listing(&backend.path, &names);
    tracing::info!(
        backend = %backend,
        objects = names.len(),
        records = records.len(),
        "listed deployments"
    );
    Ok(records)
}

/// Read `record`'s config and probe the deployment it describes.
pub async fn probe(
    backend: &StorageUri,
    record: &RemoteDeploymentRecord,
    store: &impl ObjectStore,
    health: &impl HealthCheck,
) -> ProbeReport {
    let report = |url: Option<String>, status| ProbeReport {
        name: record.name.clone(),
        url,
        status,
    };

    let uri = backend.join(&record.key);
    let text = match store.read(&uri).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => return report(None, ProbeStatus::ConfigUnreadable(format!("{e:#}"))),
    };
    let map = match envfile::parse(&text) {
        Ok(map) => map,
        Err(e) => return report(None, ProbeStatus::ConfigUnreadable(e.to_string())),
    };
    let root = match fleet::root_url(&map) {
        Ok(root) => root,
        Err(reason) => return report(None, ProbeStatus::ConfigUnreadable(reason)),
    };

    let status = health.probe(&root).await;
    tracing::debug!(deployment = %record.name, %status, "probed");
    report(Some(root), status)
}

/// List every deployment and probe each one in turn.
///
/// # Errors
///
/// Returns an error only if the listing itself fails.
pub async fn list_and_probe(
    backend: &StorageUri,
    store: &impl ObjectStore,
    health: &impl HealthCheck,
    reporter: &impl ProgressReporter,
) -> Result<Vec<ProbeReport>> {
    reporter.step("getting cloud deployments");
    let records = list(backend, store).await?;
    let mut reports = Vec::with_capacity(records.len());
    for record in &records {
        reporter.step(&format!("checking instance {}", record.name));
        reports.push(probe(backend, record, store, health).await);
    }
    Ok(reports)
}
