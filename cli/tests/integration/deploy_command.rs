//! Integration tests for `platform-deploy deploy`.
//!
//! Every scenario fails before any remote call: type problems are caught on
//! load and the configs only carry format errors.

#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOCAL_DEFAULTS: &str = r#"OT_DEPLOYMENT_TYPE="local"
OT_RELEASE="25.06"
OT_RELEASE_URL="https://ftp.ebi.ac.uk/pub/databases/opentargets/platform"
OT_API_IMAGE=""
OT_API_TAG=""
OT_API_AI_IMAGE=""
OT_API_AI_TAG=""
OT_WEBAPP_IMAGE=""
OT_WEBAPP_TAG=""
OT_CLICKHOUSE_TAG=""
OT_OPENSEARCH_TAG=""
"#;

/// A working directory with a templates dir holding the local defaults.
fn workspace() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let etc = dir.path().join("etc");
    std::fs::create_dir(&etc).expect("etc dir");
    std::fs::write(etc.join("defaults-local"), LOCAL_DEFAULTS).expect("defaults");
    dir
}

fn platform_deploy(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("platform-deploy"));
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("OT_RELEASE")
        .env_remove("OT_TEMPLATES_DIR")
        .arg("--templates")
        .arg(cwd.join("etc"));
    cmd
}

#[test]
fn test_config_of_other_type_is_rejected() {
    let dir = workspace();
    std::fs::write(dir.path().join("cloud.env"), "OT_DEPLOYMENT_TYPE=\"cloud\"\n")
        .expect("config");

    platform_deploy(dir.path())
        .args(["deploy", "local", "--unattended", "--config", "cloud.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "config file is for deployment type 'cloud', not 'local'",
        ));
}

#[test]
fn test_config_without_type_is_rejected() {
    let dir = workspace();
    std::fs::write(dir.path().join("untyped.env"), "OT_RELEASE=\"25.09\"\n").expect("config");

    platform_deploy(dir.path())
        .args(["deploy", "local", "--unattended", "--config", "untyped.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "config file does not contain OT_DEPLOYMENT_TYPE setting",
        ));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = workspace();

    platform_deploy(dir.path())
        .args(["deploy", "local", "--unattended", "--config", "nope.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_unattended_reports_every_invalid_setting() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("bad.env"),
        "OT_DEPLOYMENT_TYPE=\"local\"\nOT_RELEASE=\"2506\"\nOT_RELEASE_URL=\"ftp://example.org\"\n",
    )
    .expect("config");

    platform_deploy(dir.path())
        .args(["deploy", "local", "--unattended", "--config", "bad.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bad configuration ("))
        .stderr(predicate::str::contains("invalid data release"))
        .stderr(predicate::str::contains("invalid release url"))
        .stderr(predicate::str::contains("invalid api docker image name: cannot be empty"));

    assert!(!dir.path().join("deployment-local-2506").exists());
}

#[test]
fn test_environment_overrides_file_values() {
    let dir = workspace();

    platform_deploy(dir.path())
        .env("OT_RELEASE", "not-a-release")
        .args(["deploy", "local", "--unattended"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'not-a-release' has invalid format"));

    assert!(!dir.path().join("deployment-local-not-a-release").exists());
}
