//! `ResourceChecker` over the Google REST APIs, with container images
//! checked through `docker manifest inspect`.

use crate::application::ports::{CommandRunner, ResourceChecker, ResourceError};
use crate::domain::{RemoteResource, ResourceKind};

use super::{CHECK_TIMEOUT, GoogleCloud, api_url, classify_status};

const RESOURCE_MANAGER_API: &str = "https://cloudresourcemanager.googleapis.com/v3";
const COMPUTE_API: &str = "https://compute.googleapis.com/compute/v1";
const SECRET_MANAGER_API: &str = "https://secretmanager.googleapis.com/v1";
const DNS_API: &str = "https://dns.googleapis.com/dns/v1";
const IAM_API: &str = "https://iam.googleapis.com/v1";
const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1";

/// REST endpoint (base, segments) that answers 200 iff `resource` exists.
/// `None` for resources that are not looked up over REST.
#[must_use]
pub fn endpoint(resource: &RemoteResource) -> Option<(&'static str, Vec<&str>)> {
    let found = match resource {
        RemoteResource::Project(id) => (RESOURCE_MANAGER_API, vec!["projects", id.as_str()]),
        RemoteResource::Bucket(name) => (STORAGE_API, vec!["b", name.as_str()]),
        RemoteResource::Scoped {
            kind,
            project,
            name,
        } => {
            let (p, n) = (project.as_str(), name.as_str());
            match kind {
                ResourceKind::Region => (COMPUTE_API, vec!["projects", p, "regions", n]),
                ResourceKind::Zone => (COMPUTE_API, vec!["projects", p, "zones", n]),
                ResourceKind::Snapshot => {
                    (COMPUTE_API, vec!["projects", p, "global", "snapshots", n])
                }
                ResourceKind::Network => {
                    (COMPUTE_API, vec!["projects", p, "global", "networks", n])
                }
                ResourceKind::Secret => (SECRET_MANAGER_API, vec!["projects", p, "secrets", n]),
                ResourceKind::DnsZone => (DNS_API, vec!["projects", p, "managedZones", n]),
                ResourceKind::ServiceAccount => {
                    (IAM_API, vec!["projects", p, "serviceAccounts", n])
                }
            }
        }
        RemoteResource::Image(_) => return None,
    };
    Some(found)
}

/// Classify `docker manifest inspect` stderr.
#[must_use]
pub fn classify_manifest_error(stderr: &str) -> ResourceError {
    let lower = stderr.to_lowercase();
    if lower.contains("no such manifest")
        || lower.contains("manifest unknown")
        || lower.contains("not found")
    {
        ResourceError::NotFound
    } else if lower.contains("denied") || lower.contains("unauthorized") {
        ResourceError::PermissionDenied
    } else if lower.contains("invalid reference format") {
        ResourceError::Malformed
    } else {
        ResourceError::Other(stderr.trim().to_string())
    }
}

impl<R: CommandRunner> GoogleCloud<R> {
    async fn check_image(&self, reference: &str) -> Result<(), ResourceError> {
        let out = self
            .runner
            .run_with_timeout("docker", &["manifest", "inspect", reference], CHECK_TIMEOUT)
            .await
            .map_err(|e| ResourceError::Other(format!("unable to run docker: {e:#}")))?;
        if out.status.success() {
            return Ok(());
        }
        Err(classify_manifest_error(&String::from_utf8_lossy(&out.stderr)))
    }

    async fn check_rest(&self, base: &str, segments: &[&str]) -> Result<(), ResourceError> {
        let other = |e: anyhow::Error| {
            ResourceError::Other(format!("unable to access google cloud: {e:#}"))
        };
        let url = api_url(base, segments).map_err(other)?;
        let token = self.token.get().await.map_err(other)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .timeout(CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|e| other(e.into()))?;
        classify_status(response.status())
    }
}

impl<R: CommandRunner> ResourceChecker for GoogleCloud<R> {
    async fn check(&self, resource: &RemoteResource) -> Result<(), ResourceError> {
        tracing::debug!(%resource, "checking remote resource");
        match resource {
            RemoteResource::Image(reference) => self.check_image(reference).await,
            other => match endpoint(other) {
                Some((base, segments)) => self.check_rest(base, &segments).await,
                None => Ok(()),
            },
        }
    }
}
