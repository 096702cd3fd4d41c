//! Google Cloud adapters: object storage and resource existence checks over
//! the REST APIs, authenticated with a bearer token.

mod resources;
mod storage;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{StatusCode, Url};
use tokio::sync::OnceCell;

use crate::application::ports::{CommandRunner, ResourceError};

/// Environment variable holding a ready-made access token.
pub const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Timeout for a single resource existence check.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for any other API request, such as reading or listing objects.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Access token from `GOOGLE_OAUTH_ACCESS_TOKEN`, else from
/// `gcloud auth print-access-token`. Fetched once per process.
pub struct AccessToken<R: CommandRunner> {
    runner: R,
    cached: OnceCell<String>,
}

impl<R: CommandRunner> AccessToken<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            cached: OnceCell::new(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if no token is configured and `gcloud` fails.
    pub async fn get(&self) -> Result<&str> {
        let token = self
            .cached
            .get_or_try_init(|| async {
                if let Some(token) = std::env::var(TOKEN_ENV)
                    .ok()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                {
                    return Ok(token);
                }
                let out = self
                    .runner
                    .run("gcloud", &["auth", "print-access-token"])
                    .await
                    .context("unable to access google cloud: gcloud is not available")?;
                if !out.status.success() {
                    bail!(
                        "unable to access google cloud: {}",
                        String::from_utf8_lossy(&out.stderr).trim()
                    );
                }
                let token = String::from_utf8_lossy(&out.stdout).trim().to_string();
                tracing::debug!("obtained access token from gcloud");
                Ok::<String, anyhow::Error>(token)
            })
            .await?;
        Ok(token)
    }
}

/// Authenticated client for the Google REST APIs. Implements both
/// `ObjectStore` and `ResourceChecker`.
pub struct GoogleCloud<R: CommandRunner> {
    http: reqwest::Client,
    token: AccessToken<R>,
    runner: R,
}

impl<R: CommandRunner + Clone> GoogleCloud<R> {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(runner: R) -> Result<Self> {
        Ok(Self {
            http: http_client(REQUEST_TIMEOUT)?,
            token: AccessToken::new(runner.clone()),
            runner,
        })
    }
}

/// Client whose requests fail once `timeout` elapses without a complete
/// response. Per-request timeouts override it.
fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(concat!("platform-deploy/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

/// `base` with each of `segments` appended as one percent-encoded segment.
///
/// # Errors
///
/// Returns an error if `base` is not an absolute URL.
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid API base {base}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("API base {base} cannot have a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map an API status to the existence-check taxonomy.
///
/// # Errors
///
/// Returns the matching `ResourceError` for any non-success status.
pub fn classify_status(status: StatusCode) -> Result<(), ResourceError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(ResourceError::NotFound),
        StatusCode::BAD_REQUEST => Err(ResourceError::Malformed),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ResourceError::PermissionDenied),
        s => Err(ResourceError::Other(format!(
            "unexpected response from google cloud: {s}"
        ))),
    }
}
