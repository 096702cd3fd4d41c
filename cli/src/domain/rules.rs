//! Validation rules: pure format checks and conditional policy.
//!
//! A rule never performs I/O. `check` either rejects the value outright or
//! returns the remote resource whose existence still has to be confirmed.
//! Rules that depend on other settings name them by env var and read their
//! live value through a [`FieldReader`] at check time.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::ValidationCause;
use crate::domain::setting::FieldReader;
use crate::domain::storage::StorageUri;

/// Days-to-live upper bound for cloud deployments.
pub const MAX_DAYS_TO_LIVE: u32 = 14;

/// The only subdomain allowed to live forever (days-to-live `0`).
pub const NO_EXPIRY_SUBDOMAIN: &str = "dev";

/// Network partner-preview deployments must run in.
pub const PPP_NETWORK: &str = "devinstance-ppp";

/// Web-app flavors.
pub const WEBAPP_FLAVORS: &[&str] = &["platform", "ppp"];

const MAX_SUBDOMAIN_LEN: usize = 16;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_URL_LEN: usize = 2048;
const MAX_GCP_RESOURCE_LEN: usize = 63;

static RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d{2}\.\d{2}$").expect("valid regex")
});

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}$").expect("valid regex")
});

static SUBDOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9_-]*[a-z0-9])?$").expect("valid regex")
});

static GCP_RESOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").expect("valid regex")
});

/// Project-scoped GCP resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Region,
    Zone,
    Snapshot,
    Secret,
    DnsZone,
    Network,
    ServiceAccount,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Zone => "zone",
            Self::Snapshot => "snapshot",
            Self::Secret => "secret",
            Self::DnsZone => "dns zone",
            Self::Network => "network",
            Self::ServiceAccount => "service account",
        }
    }
}

/// A resource that must exist remotely for a value to be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResource {
    Project(String),
    Scoped {
        kind: ResourceKind,
        project: String,
        name: String,
    },
    Bucket(String),
    /// A container image reference, `name` or `name:tag`.
    Image(String),
}

impl RemoteResource {
    /// Quoted label used in "does not exist" style messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Project(name) | Self::Scoped { name, .. } | Self::Image(name) => {
                format!("'{name}'")
            }
            Self::Bucket(name) => format!("bucket '{name}'"),
        }
    }
}

impl fmt::Display for RemoteResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(name) => write!(f, "project {name}"),
            Self::Scoped { kind, name, .. } => write!(f, "{} {name}", kind.as_str()),
            Self::Bucket(name) => write!(f, "bucket {name}"),
            Self::Image(name) => write!(f, "image {name}"),
        }
    }
}

/// Validation rule attached to a setting.
///
/// `&'static str` fields are env names of companion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NotEmpty,
    Release,
    Url,
    DomainName,
    SubdomainName,
    WebAppFlavor,
    DaysToLive { subdomain: &'static str },
    OpsUri,
    ImageName,
    ImageTag { image: &'static str },
    GcpProject,
    GcpResource { kind: ResourceKind, project: &'static str },
    GcpNetwork { flavor: &'static str, project: &'static str },
    GcpServiceAccount { project: &'static str },
}

impl Rule {
    /// Run the local part of the rule.
    ///
    /// # Errors
    ///
    /// Returns the cause when the value is rejected without a remote lookup.
    pub fn check(
        self,
        value: &str,
        fields: &dyn FieldReader,
    ) -> Result<Option<RemoteResource>, ValidationCause> {
        match self {
            Self::NotEmpty => not_empty(value).map(|()| None),
            Self::Release => release(value).map(|()| None),
            Self::Url => url(value).map(|()| None),
            Self::DomainName => domain_name(value).map(|()| None),
            Self::SubdomainName => subdomain_name(value).map(|()| None),
            Self::WebAppFlavor => webapp_flavor(value).map(|()| None),
            Self::DaysToLive { subdomain } => {
                days_to_live(value, fields.field(subdomain).unwrap_or_default()).map(|()| None)
            }
            Self::OpsUri => {
                not_empty(value)?;
                let uri = StorageUri::parse_object(value)
                    .map_err(|e| ValidationCause::Format(e.to_string()))?;
                Ok(Some(RemoteResource::Bucket(uri.bucket)))
            }
            Self::ImageName => {
                not_empty(value)?;
                Ok(Some(RemoteResource::Image(value.to_string())))
            }
            Self::ImageTag { image } => {
                not_empty(value)?;
                let image = dependency(fields, image, "image name")?;
                Ok(Some(RemoteResource::Image(format!("{image}:{value}"))))
            }
            Self::GcpProject => {
                gcp_resource_name(value)?;
                Ok(Some(RemoteResource::Project(value.to_string())))
            }
            Self::GcpResource { kind, project } => {
                gcp_resource_name(value)?;
                let project = dependency(fields, project, "gcp project")?;
                Ok(Some(scoped(kind, project, value)))
            }
            Self::GcpNetwork { flavor, project } => {
                gcp_resource_name(value)?;
                network_policy(value, fields.field(flavor).unwrap_or_default())?;
                let project = dependency(fields, project, "gcp project")?;
                Ok(Some(scoped(ResourceKind::Network, project, value)))
            }
            Self::GcpServiceAccount { project } => {
                not_empty(value)?;
                let project = dependency(fields, project, "gcp project")?;
                Ok(Some(scoped(ResourceKind::ServiceAccount, project, value)))
            }
        }
    }
}

fn scoped(kind: ResourceKind, project: &str, name: &str) -> RemoteResource {
    RemoteResource::Scoped {
        kind,
        project: project.to_string(),
        name: name.to_string(),
    }
}

fn dependency<'a>(
    fields: &'a dyn FieldReader,
    env: &str,
    label: &'static str,
) -> Result<&'a str, ValidationCause> {
    match fields.field(env) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationCause::DependencyUnset(label)),
    }
}

// ── Format checks ─────────────────────────────────────────────────────────────

/// # Errors
///
/// Rejects the empty string.
pub fn not_empty(v: &str) -> Result<(), ValidationCause> {
    if v.is_empty() {
        return Err(ValidationCause::Empty);
    }
    Ok(())
}

/// # Errors
///
/// Rejects values longer than `max` bytes.
pub fn max_length(v: &str, max: usize) -> Result<(), ValidationCause> {
    if v.len() > max {
        return Err(ValidationCause::TooLong {
            value: v.to_string(),
            max,
        });
    }
    Ok(())
}

/// Data release name, `YY.MM`.
///
/// # Errors
///
/// Rejects anything but two digits, a dot, two digits.
pub fn release(v: &str) -> Result<(), ValidationCause> {
    if !RELEASE_RE.is_match(v) {
        return Err(ValidationCause::Format(format!(
            "'{v}' has invalid format, it should be '25.06'"
        )));
    }
    Ok(())
}

/// Release bucket URL.
///
/// # Errors
///
/// Rejects short values, unknown schemes, trailing slashes and overlong URLs.
pub fn url(v: &str) -> Result<(), ValidationCause> {
    if v.len() < 5 {
        return Err(ValidationCause::Format(format!("'{v}' is too short")));
    }
    if !(v.starts_with("http") || v.starts_with("gs")) {
        return Err(ValidationCause::Format(format!(
            "'{v}' must start with http(s):// or gs://"
        )));
    }
    if v.ends_with('/') {
        return Err(ValidationCause::Format(format!(
            "'{v}' must not end with a slash"
        )));
    }
    max_length(v, MAX_URL_LEN)
}

/// # Errors
///
/// Rejects anything that is not a lowercase fully qualified domain name.
pub fn domain_name(v: &str) -> Result<(), ValidationCause> {
    not_empty(v)?;
    max_length(v, MAX_DOMAIN_LEN)?;
    if !DOMAIN_RE.is_match(v) {
        return Err(ValidationCause::Format(
            "must be a fully qualified domain name with lowercase letters, numbers, and hyphens"
                .into(),
        ));
    }
    Ok(())
}

/// Single-level subdomain, at most 16 characters.
///
/// # Errors
///
/// Rejects empty, overlong and multi-level names.
pub fn subdomain_name(v: &str) -> Result<(), ValidationCause> {
    not_empty(v)?;
    max_length(v, MAX_SUBDOMAIN_LEN)?;
    if !SUBDOMAIN_RE.is_match(v) {
        return Err(ValidationCause::Format(
            "only single level subdomains composed of lowercase letters, numbers, hyphens, and underscores are allowed"
                .into(),
        ));
    }
    Ok(())
}

/// Days-to-live in `[0, 14]`; `0` only for the no-expiry subdomain.
///
/// # Errors
///
/// Rejects non-numeric and out-of-range values, and `0` for any other
/// subdomain.
pub fn days_to_live(v: &str, subdomain: &str) -> Result<(), ValidationCause> {
    not_empty(v)?;
    let days = v
        .parse::<i64>()
        .ok()
        .filter(|d| (0..=i64::from(MAX_DAYS_TO_LIVE)).contains(d))
        .ok_or_else(|| {
            ValidationCause::Format(format!("must be a number between 0 and {MAX_DAYS_TO_LIVE}"))
        })?;
    if days == 0 && subdomain != NO_EXPIRY_SUBDOMAIN {
        return Err(ValidationCause::Format(format!(
            "0 (no expiry) is only allowed for the '{NO_EXPIRY_SUBDOMAIN}' subdomain"
        )));
    }
    Ok(())
}

/// # Errors
///
/// Rejects anything outside [`WEBAPP_FLAVORS`].
pub fn webapp_flavor(v: &str) -> Result<(), ValidationCause> {
    not_empty(v)?;
    if !WEBAPP_FLAVORS.contains(&v) {
        return Err(ValidationCause::Format(format!(
            "must be one of {}",
            WEBAPP_FLAVORS.join(", ")
        )));
    }
    Ok(())
}

/// GCP resource identifier: 1–63 chars, `[a-z]([-a-z0-9]*[a-z0-9])?`.
///
/// # Errors
///
/// Rejects empty, overlong and badly shaped names.
pub fn gcp_resource_name(v: &str) -> Result<(), ValidationCause> {
    if v.is_empty() || v.len() > MAX_GCP_RESOURCE_LEN {
        return Err(ValidationCause::Format(
            "must be between 1 and 63 characters long".into(),
        ));
    }
    if !GCP_RESOURCE_RE.is_match(v) {
        return Err(ValidationCause::Format(
            "can only contain lowercase letters, numbers, and hyphens, and must start with a letter"
                .into(),
        ));
    }
    Ok(())
}

/// Partner-preview deployments are pinned to [`PPP_NETWORK`].
///
/// # Errors
///
/// Rejects any other network when `flavor` is `ppp`.
pub fn network_policy(network: &str, flavor: &str) -> Result<(), ValidationCause> {
    if flavor == "ppp" && network != PPP_NETWORK {
        return Err(ValidationCause::Format(format!(
            "must be {PPP_NETWORK} for ppp deployments"
        )));
    }
    Ok(())
}
