//! Deployment configurations: the Local and Cloud setting catalogues and the
//! capability set both variants share.

use std::fmt;
use std::path::PathBuf;

use crate::domain::envfile::EnvMap;
use crate::domain::error::{ConfigError, DestroyError};
use crate::domain::rules::{ResourceKind, Rule};
use crate::domain::setting::{Choice, Setting, Settings};

/// Key carrying the deployment type in every config source.
pub const DEPLOYMENT_TYPE_KEY: &str = "OT_DEPLOYMENT_TYPE";

/// File name of the persisted config inside a deployment directory.
pub const CONFIG_FILE: &str = "config";

/// Length of the generated subdomain when none is configured.
pub const RANDOM_SUBDOMAIN_LEN: usize = 4;

// ── Setting env names ─────────────────────────────────────────────────────────

pub const RELEASE: &str = "OT_RELEASE";
pub const RELEASE_URL: &str = "OT_RELEASE_URL";
pub const API_IMAGE: &str = "OT_API_IMAGE";
pub const API_TAG: &str = "OT_API_TAG";
pub const API_AI_IMAGE: &str = "OT_API_AI_IMAGE";
pub const API_AI_TAG: &str = "OT_API_AI_TAG";
pub const WEBAPP_IMAGE: &str = "OT_WEBAPP_IMAGE";
pub const WEBAPP_TAG: &str = "OT_WEBAPP_TAG";
pub const CLICKHOUSE_TAG: &str = "OT_CLICKHOUSE_TAG";
pub const OPENSEARCH_TAG: &str = "OT_OPENSEARCH_TAG";
pub const API_AI_TOKEN: &str = "OT_API_AI_TOKEN";

pub const GCP_PROJECT: &str = "TF_VAR_OT_GCP_PROJECT";
pub const GCP_REGION: &str = "TF_VAR_OT_GCP_REGION";
pub const GCP_ZONE: &str = "TF_VAR_OT_GCP_ZONE";
pub const OPS_URI: &str = "OT_OPS_URI";
pub const DOMAIN_NAME: &str = "TF_VAR_OT_DOMAIN_NAME";
pub const SUBDOMAIN_NAME: &str = "TF_VAR_OT_SUBDOMAIN_NAME";
pub const DAYS_TO_LIVE: &str = "TF_VAR_OT_DAYS_TO_LIVE";
pub const WEBAPP_FLAVOR: &str = "OT_WEBAPP_FLAVOR";
pub const SNAPSHOT_CH: &str = "TF_VAR_OT_SNAPSHOT_CH";
pub const SNAPSHOT_OS: &str = "TF_VAR_OT_SNAPSHOT_OS";
pub const GCP_SECRET_AI_TOKEN: &str = "TF_VAR_OT_GCP_SECRET_AI_TOKEN";
pub const GCP_CLOUD_DNS_ZONE: &str = "TF_VAR_OT_GCP_CLOUD_DNS_ZONE";
pub const GCP_NETWORK: &str = "TF_VAR_OT_GCP_NETWORK";
pub const GCP_SA: &str = "TF_VAR_OT_GCP_SA";
pub const API_CACHE: &str = "PLATFORM_API_IGNORE_CACHE";

const FLAVOR_CHOICES: &[Choice] = &[
    Choice {
        label: "platform",
        value: "platform",
    },
    Choice {
        label: "ppp",
        value: "ppp",
    },
];

// The variable is "ignore cache", so enabling the cache stores `false`.
const CACHE_CHOICES: &[Choice] = &[
    Choice {
        label: "yes",
        value: "false",
    },
    Choice {
        label: "no",
        value: "true",
    },
];

// ── Deployment kind ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentKind {
    Local,
    Cloud,
}

impl DeploymentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }

    /// Parse the value of `OT_DEPLOYMENT_TYPE`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "local" => Some(Self::Local),
            "cloud" => Some(Self::Cloud),
            _ => None,
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Catalogues ────────────────────────────────────────────────────────────────

fn software_settings() -> Vec<Setting> {
    const GROUP: &str = "Software versions";
    vec![
        Setting::new(API_IMAGE, "API docker image name", GROUP).rule(Rule::ImageName),
        Setting::new(API_TAG, "API docker image tag", GROUP)
            .describe("Check available tags at https://github.com/opentargets/platform-api/pkgs/container/platform-api")
            .rule(Rule::ImageTag { image: API_IMAGE }),
        Setting::new(API_AI_IMAGE, "AI API docker image name", GROUP).rule(Rule::ImageName),
        Setting::new(API_AI_TAG, "AI API docker image tag", GROUP)
            .describe("Check available tags at https://github.com/opentargets/ot-ai-api/pkgs/container/ot-ai-api")
            .rule(Rule::ImageTag {
                image: API_AI_IMAGE,
            }),
        Setting::new(WEBAPP_IMAGE, "WebApp docker image name", GROUP).rule(Rule::ImageName),
        Setting::new(WEBAPP_TAG, "WebApp docker image tag", GROUP)
            .describe("Check available tags at https://github.com/opentargets/ot-ui-apps/pkgs/container/ot-ui-apps")
            .rule(Rule::ImageTag {
                image: WEBAPP_IMAGE,
            }),
        Setting::new(CLICKHOUSE_TAG, "ClickHouse docker image tag", GROUP).rule(Rule::NotEmpty),
        Setting::new(OPENSEARCH_TAG, "OpenSearch docker image tag", GROUP).rule(Rule::NotEmpty),
    ]
}

fn local_catalogue() -> Vec<Setting> {
    let mut settings = vec![
        Setting::new(RELEASE, "Data release", "Data release settings")
            .describe("The data release name should be in the form YY.MM, e.g. 25.06 for the June 2025 release.")
            .rule(Rule::Release),
        Setting::new(RELEASE_URL, "Release URL", "Data release settings")
            .describe("URL to the release tarball")
            .rule(Rule::Url),
    ];
    settings.extend(software_settings());
    settings.push(
        Setting::new(API_AI_TOKEN, "AI API token", "Additional settings")
            .describe("The API token to use inside the AI API for the publication summarization feature.")
            .secret("openai_token"),
    );
    settings
}

fn cloud_catalogue() -> Vec<Setting> {
    const GCP: &str = "GCP global settings";
    const DEPLOYMENT: &str = "Deployment settings";
    const SNAPSHOTS: &str = "Data snapshots";
    const ADDITIONAL: &str = "Additional settings";

    let scoped = |kind| Rule::GcpResource {
        kind,
        project: GCP_PROJECT,
    };

    let mut settings = vec![
        Setting::new(GCP_PROJECT, "GCP Project", GCP).rule(Rule::GcpProject),
        Setting::new(GCP_REGION, "GCP Region", GCP).rule(scoped(ResourceKind::Region)),
        Setting::new(GCP_ZONE, "GCP Zone", GCP).rule(scoped(ResourceKind::Zone)),
        Setting::new(OPS_URI, "Ops URI", GCP)
            .describe("The URI where the deployment config and state will be persisted. This will be used as terraform backend.")
            .rule(Rule::OpsUri),
        Setting::new(DOMAIN_NAME, "Domain name", DEPLOYMENT).rule(Rule::DomainName),
        Setting::new(SUBDOMAIN_NAME, "Subdomain name", DEPLOYMENT)
            .describe("Subdomains should be only one level deep and contain only lowercase letters, numbers, and hyphens.")
            .rule(Rule::SubdomainName),
        Setting::new(DAYS_TO_LIVE, "Days to live", DEPLOYMENT)
            .describe("The deployment will be destroyed after this many days (0 for no expiry, dev only)")
            .rule(Rule::DaysToLive {
                subdomain: SUBDOMAIN_NAME,
            }),
        Setting::new(WEBAPP_FLAVOR, "Web App flavour", DEPLOYMENT)
            .describe("The flavor of the web application: `platform` or `ppp` partner preview (only available internally).")
            .rule(Rule::WebAppFlavor)
            .choices(FLAVOR_CHOICES),
        Setting::new(SNAPSHOT_CH, "ClickHouse data snapshot", SNAPSHOTS)
            .rule(scoped(ResourceKind::Snapshot)),
        Setting::new(SNAPSHOT_OS, "OpenSearch data snapshot", SNAPSHOTS)
            .rule(scoped(ResourceKind::Snapshot)),
    ];
    settings.extend(software_settings());
    settings.extend([
        Setting::new(GCP_SECRET_AI_TOKEN, "GCP AI API token secret", ADDITIONAL)
            .describe("The Google Cloud Secret Manager secret that contains the API token to use inside the AI API for the publication summarization feature.")
            .rule(scoped(ResourceKind::Secret)),
        Setting::new(GCP_CLOUD_DNS_ZONE, "GCP Cloud DNS Zone", ADDITIONAL)
            .rule(scoped(ResourceKind::DnsZone)),
        Setting::new(GCP_NETWORK, "GCP Network", ADDITIONAL).rule(Rule::GcpNetwork {
            flavor: WEBAPP_FLAVOR,
            project: GCP_PROJECT,
        }),
        Setting::new(GCP_SA, "GCP Service Account", ADDITIONAL)
            .describe("Input in email form, e.g. `service-account@project.iam.gserviceaccount.com`.")
            .rule(Rule::GcpServiceAccount {
                project: GCP_PROJECT,
            }),
        Setting::new(API_CACHE, "API cache", ADDITIONAL)
            .describe("Whether the API should use caching (recommended) or not. Disable for development purposes.")
            .choices(CACHE_CHOICES),
    ]);
    settings
}

fn fill(mut settings: Vec<Setting>, map: &EnvMap) -> Settings {
    for s in &mut settings {
        if let Some(v) = map.get(s.env) {
            s.value.clone_from(v);
        }
    }
    Settings::new(settings)
}

/// Random lowercase alphanumeric string of `len` characters.
///
/// Entropy sources: nanosecond timestamp and per-character `RandomState` hashes.
#[must_use]
pub fn random_name(len: usize) -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    (0..len)
        .map(|i| {
            let mut hasher = RandomState::new().build_hasher();
            hasher.write_u128(nanos);
            hasher.write_usize(i);
            // Modulo of a small alphabet; truncation is intended.
            #[allow(clippy::cast_possible_truncation)]
            let idx = (hasher.finish() % ALPHABET.len() as u64) as usize;
            char::from(ALPHABET[idx])
        })
        .collect()
}

// ── Variants ──────────────────────────────────────────────────────────────────

/// Local deployment: identity is the data release.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    settings: Settings,
}

impl LocalConfig {
    #[must_use]
    pub fn from_map(map: &EnvMap) -> Self {
        Self {
            settings: fill(local_catalogue(), map),
        }
    }

    #[must_use]
    pub fn release(&self) -> &str {
        self.settings.value(RELEASE)
    }

    #[must_use]
    pub fn release_url(&self) -> &str {
        self.settings.value(RELEASE_URL)
    }
}

/// Cloud deployment: identity is the subdomain.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    settings: Settings,
}

impl CloudConfig {
    #[must_use]
    pub fn from_map(map: &EnvMap) -> Self {
        let mut settings = fill(cloud_catalogue(), map);
        if settings.value(SUBDOMAIN_NAME).is_empty() {
            // Catalogue always contains these keys.
            let _ = settings.set(SUBDOMAIN_NAME, random_name(RANDOM_SUBDOMAIN_LEN));
        }
        if settings.value(API_CACHE).is_empty() {
            let _ = settings.set(API_CACHE, "false");
        }
        Self { settings }
    }

    /// Rebuild the config of an existing deployment. Nothing is generated:
    /// the subdomain and ops URI must both be recorded.
    ///
    /// # Errors
    ///
    /// Returns `DestroyError::MissingSetting` naming the first absent key.
    pub fn from_record(map: &EnvMap) -> Result<Self, DestroyError> {
        for key in [SUBDOMAIN_NAME, OPS_URI] {
            if map.get(key).is_none_or(|v| v.trim().is_empty()) {
                return Err(DestroyError::MissingSetting(key));
            }
        }
        Ok(Self::from_map(map))
    }

    #[must_use]
    pub fn subdomain(&self) -> &str {
        self.settings.value(SUBDOMAIN_NAME)
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        self.settings.value(DOMAIN_NAME)
    }

    #[must_use]
    pub fn ops_uri(&self) -> &str {
        self.settings.value(OPS_URI)
    }

    /// `https://<subdomain>.<domain>`.
    #[must_use]
    pub fn root_url(&self) -> String {
        format!("https://{}.{}", self.subdomain(), self.domain())
    }
}

/// A resolved deployment configuration.
#[derive(Debug, Clone)]
pub enum DeploymentConfig {
    Local(LocalConfig),
    Cloud(CloudConfig),
}

impl DeploymentConfig {
    /// Build a config of kind `wanted` from a flat mapping.
    ///
    /// # Errors
    ///
    /// Returns `MissingType` if the mapping has no deployment type and
    /// `TypeMismatch` if it names another kind.
    pub fn from_map(map: &EnvMap, wanted: DeploymentKind) -> Result<Self, ConfigError> {
        check_kind(map, wanted)?;
        Ok(match wanted {
            DeploymentKind::Local => Self::Local(LocalConfig::from_map(map)),
            DeploymentKind::Cloud => Self::Cloud(CloudConfig::from_map(map)),
        })
    }

    #[must_use]
    pub fn kind(&self) -> DeploymentKind {
        match self {
            Self::Local(_) => DeploymentKind::Local,
            Self::Cloud(_) => DeploymentKind::Cloud,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        match self {
            Self::Local(c) => &c.settings,
            Self::Cloud(c) => &c.settings,
        }
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        match self {
            Self::Local(c) => &mut c.settings,
            Self::Cloud(c) => &mut c.settings,
        }
    }

    /// Release for local deployments, subdomain for cloud ones.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::Local(c) => c.release(),
            Self::Cloud(c) => c.subdomain(),
        }
    }

    /// Working directory name, relative to the current directory.
    #[must_use]
    pub fn deployment_directory(&self) -> PathBuf {
        PathBuf::from(format!("deployment-{}-{}", self.kind(), self.identity()))
    }

    /// Override every setting whose env var `lookup` knows about.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let settings = self.settings_mut();
        let envs: Vec<&'static str> = settings.iter().map(|s| s.env).collect();
        for env in envs {
            if let Some(value) = lookup(env) {
                let _ = settings.set(env, value);
            }
        }
    }

    /// Render the `config` file: header, type, then one section per group.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = match self {
            Self::Local(c) => format!(
                "# Open Targets local deployment config for release {}\n",
                c.release()
            ),
            Self::Cloud(c) => format!(
                "# Open Targets cloud deployment config for {}\n",
                c.root_url()
            ),
        };
        out.push_str(&crate::domain::envfile::assignment(
            DEPLOYMENT_TYPE_KEY,
            self.kind().as_str(),
        ));
        let settings = self.settings();
        for group in settings.groups() {
            out.push_str(&format!("\n# {group}\n"));
            for s in settings.iter().filter(|s| s.group == group) {
                out.push_str(&s.serialize());
            }
        }
        out
    }

    /// Settings stored in their own files rather than in `config`.
    #[must_use]
    pub fn secret_fields(&self) -> Vec<&Setting> {
        self.settings().iter().filter(|s| s.is_secret()).collect()
    }

    /// Non-secret settings plus the deployment type, for child process envs.
    #[must_use]
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(
            DEPLOYMENT_TYPE_KEY.to_string(),
            self.kind().as_str().to_string(),
        )];
        pairs.extend(
            self.settings()
                .iter()
                .filter(|s| !s.is_secret())
                .map(|s| (s.env.to_string(), s.value.clone())),
        );
        pairs
    }
}

/// Check the deployment type recorded in `map` against `wanted`.
///
/// # Errors
///
/// Returns `MissingType` or `TypeMismatch`.
pub fn check_kind(map: &EnvMap, wanted: DeploymentKind) -> Result<(), ConfigError> {
    let found = map
        .get(DEPLOYMENT_TYPE_KEY)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingType)?;
    if found != wanted.as_str() {
        return Err(ConfigError::TypeMismatch {
            found: found.clone(),
            wanted,
        });
    }
    Ok(())
}
