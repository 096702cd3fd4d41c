//! `HealthCheck` adapter: POSTs an introspection query to a deployment's
//! GraphQL endpoint and classifies the outcome.

use std::error::Error as _;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::HealthCheck;
use crate::domain::ProbeStatus;
use crate::domain::fleet::{HEALTH_QUERY, graphql_url};

/// Timeout for one liveness probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe over HTTP.
pub struct HttpHealthCheck {
    http: reqwest::Client,
}

impl HttpHealthCheck {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("platform-deploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http })
    }
}

/// Map a transport failure onto a probe status.
#[must_use]
pub fn classify_transport(err: &reqwest::Error) -> ProbeStatus {
    if err.is_timeout() {
        return ProbeStatus::Timeout;
    }
    let mut source = err.source();
    let mut messages = Vec::new();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return ProbeStatus::ConnectionRefused;
            }
        }
        messages.push(cause.to_string().to_lowercase());
        source = cause.source();
    }
    if messages.iter().any(|m| m.contains("connection refused")) {
        return ProbeStatus::ConnectionRefused;
    }
    if messages
        .iter()
        .any(|m| m.contains("dns error") || m.contains("failed to lookup"))
    {
        return ProbeStatus::UnknownHost;
    }
    ProbeStatus::NetworkError
}

impl HealthCheck for HttpHealthCheck {
    async fn probe(&self, root_url: &str) -> ProbeStatus {
        let url = graphql_url(root_url);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(HEALTH_QUERY)
            .send()
            .await;
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(%url, error = %e, "probe failed");
                return classify_transport(&e);
            }
        };
        let status = response.status().as_u16();
        if status != 200 {
            return ProbeStatus::HttpStatus(status);
        }
        match response.text().await {
            Ok(body) => ProbeStatus::from_response(status, &body),
            Err(e) if e.is_timeout() => ProbeStatus::Timeout,
            Err(_) => ProbeStatus::NetworkError,
        }
    }
}
