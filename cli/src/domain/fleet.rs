//! Deployments recorded in the ops bucket and their liveness status.

use std::fmt;

use crate::domain::deployment::{DOMAIN_NAME, SUBDOMAIN_NAME};
use crate::domain::envfile::EnvMap;

/// Object suffixes owned by the provisioning backend, never deployment records.
pub const BACKEND_SUFFIXES: &[&str] = &[".tfstate", ".tflock"];

/// Introspection query posted to a deployment's API.
pub const HEALTH_QUERY: &str = r#"{"query": "{ meta { name } }"}"#;

/// Substring a healthy API response contains.
pub const LIVE_MARKER: &str = "Open Targets";

/// One deployment config object found under the ops prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDeploymentRecord {
    /// Object key relative to the listed prefix.
    pub key: String,
    /// Deployment name (first path segment of `key`).
    pub name: String,
}

/// Turn a bucket listing into deployment records.
///
/// `names` are full object names; `prefix` is the listed prefix. Backend
/// state objects are skipped.
#[must_use]
pub fn records_from_listing(prefix: &str, names: &[String]) -> Vec<RemoteDeploymentRecord> {
    let prefix = prefix.trim_matches('/');
    names
        .iter()
        .filter_map(|full| {
            let relative = full
                .strip_prefix(prefix)
                .unwrap_or(full)
                .trim_start_matches('/');
            if relative.is_empty()
                || relative.ends_with('/')
                || BACKEND_SUFFIXES.iter().any(|s| relative.ends_with(s))
            {
                return None;
            }
            let name = relative.split('/').next().unwrap_or(relative);
            Some(RemoteDeploymentRecord {
                key: relative.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// `https://<subdomain>.<domain>` from a deployment config mapping.
///
/// # Errors
///
/// Returns a description of the missing key when either part is absent.
pub fn root_url(config: &EnvMap) -> Result<String, String> {
    let part = |key: &str| {
        config
            .get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("{key} is missing"))
    };
    Ok(format!("https://{}.{}", part(SUBDOMAIN_NAME)?, part(DOMAIN_NAME)?))
}

/// GraphQL endpoint under a deployment root URL.
#[must_use]
pub fn graphql_url(root_url: &str) -> String {
    format!("{root_url}/api/v4/graphql")
}

/// Outcome of one liveness probe. Always data, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Live,
    HttpStatus(u16),
    Timeout,
    UnknownHost,
    ConnectionRefused,
    NetworkError,
    UnknownResponse,
    ConfigUnreadable(String),
}

impl ProbeStatus {
    /// Classify a completed HTTP exchange.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        if status != 200 {
            Self::HttpStatus(status)
        } else if body.contains(LIVE_MARKER) {
            Self::Live
        } else {
            Self::UnknownResponse
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::HttpStatus(code) => write!(f, "{code}"),
            Self::Timeout => f.write_str("timeout"),
            Self::UnknownHost => f.write_str("unknown-host"),
            Self::ConnectionRefused => f.write_str("connection-refused"),
            Self::NetworkError => f.write_str("network-error"),
            Self::UnknownResponse => f.write_str("unknown-response"),
            Self::ConfigUnreadable(reason) => write!(f, "unable to read config: {reason}"),
        }
    }
}

/// A record together with its probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub name: String,
    pub url: Option<String>,
    pub status: ProbeStatus,
}
