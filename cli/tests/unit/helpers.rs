//! Config fixtures shared by the service tests.

#![allow(clippy::expect_used)]

use platform_deploy::domain::envfile::{self, EnvMap};
use platform_deploy::domain::{CloudConfig, DeploymentConfig, DeploymentKind, LocalConfig};

/// A complete, valid cloud config file.
pub const CLOUD_CONFIG: &str = r#"# cloud deployment
OT_DEPLOYMENT_TYPE="cloud"
TF_VAR_OT_GCP_PROJECT="open-targets-eu-dev"
TF_VAR_OT_GCP_REGION="europe-west1"
TF_VAR_OT_GCP_ZONE="europe-west1-d"
OT_OPS_URI="gs://open-targets-ops/terraform/devinstance"
TF_VAR_OT_DOMAIN_NAME="dev.opentargets.xyz"
TF_VAR_OT_SUBDOMAIN_NAME="team"
TF_VAR_OT_DAYS_TO_LIVE="7"
OT_WEBAPP_FLAVOR="platform"
TF_VAR_OT_SNAPSHOT_CH="clickhouse-2506"
TF_VAR_OT_SNAPSHOT_OS="opensearch-2506"
OT_API_IMAGE="ghcr.io/opentargets/platform-api"
OT_API_TAG="25.0.3"
OT_API_AI_IMAGE="ghcr.io/opentargets/ot-ai-api"
OT_API_AI_TAG="0.1.2"
OT_WEBAPP_IMAGE="ghcr.io/opentargets/ot-ui-apps"
OT_WEBAPP_TAG="1.2.0"
OT_CLICKHOUSE_TAG="25.4"
OT_OPENSEARCH_TAG="2.19.0"
TF_VAR_OT_GCP_SECRET_AI_TOKEN="openai-token"
TF_VAR_OT_GCP_CLOUD_DNS_ZONE="opentargets-xyz"
TF_VAR_OT_GCP_NETWORK="devinstance"
TF_VAR_OT_GCP_SA="devinstance@open-targets-eu-dev.iam.gserviceaccount.com"
PLATFORM_API_IGNORE_CACHE="false"
"#;

/// A complete, valid local config file.
pub const LOCAL_CONFIG: &str = r#"OT_DEPLOYMENT_TYPE="local"
OT_RELEASE="25.06"
OT_RELEASE_URL="https://ftp.ebi.ac.uk/pub/databases/opentargets/platform"
OT_API_IMAGE="ghcr.io/opentargets/platform-api"
OT_API_TAG="25.0.3"
OT_API_AI_IMAGE="ghcr.io/opentargets/ot-ai-api"
OT_API_AI_TAG="0.1.2"
OT_WEBAPP_IMAGE="ghcr.io/opentargets/ot-ui-apps"
OT_WEBAPP_TAG="1.2.0"
OT_CLICKHOUSE_TAG="25.4"
OT_OPENSEARCH_TAG="2.19.0"
"#;

pub fn map(text: &str) -> EnvMap {
    envfile::parse(text).expect("fixture parses")
}

/// The cloud fixture with `overrides` applied.
pub fn cloud_with(overrides: &[(&str, &str)]) -> DeploymentConfig {
    let mut m = map(CLOUD_CONFIG);
    for (k, v) in overrides {
        m.insert((*k).to_string(), (*v).to_string());
    }
    DeploymentConfig::from_map(&m, DeploymentKind::Cloud).expect("cloud fixture")
}

pub fn cloud() -> CloudConfig {
    match cloud_with(&[]) {
        DeploymentConfig::Cloud(c) => c,
        DeploymentConfig::Local(_) => unreachable!("fixture is a cloud config"),
    }
}

/// The local fixture with `overrides` applied.
pub fn local_with(overrides: &[(&str, &str)]) -> DeploymentConfig {
    let mut m = map(LOCAL_CONFIG);
    for (k, v) in overrides {
        m.insert((*k).to_string(), (*v).to_string());
    }
    DeploymentConfig::from_map(&m, DeploymentKind::Local).expect("local fixture")
}

pub fn local() -> LocalConfig {
    match local_with(&[]) {
        DeploymentConfig::Local(c) => c,
        DeploymentConfig::Cloud(_) => unreachable!("fixture is a local config"),
    }
}
