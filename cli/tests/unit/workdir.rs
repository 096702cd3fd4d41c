//! Deployment directory management: templates, config file and secrets.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use platform_deploy::application::services::workdir::{
    CLOUD_TEMPLATES, CONFIG_MODE, LOCAL_TEMPLATES, SECRET_MODE, ensure_directory, persist,
    prepare_templates,
};
use platform_deploy::domain::deployment::API_AI_TOKEN;
use platform_deploy::domain::envfile;

use crate::helpers::{cloud_with, local_with};
use crate::mocks::MemFs;

fn templates_fs(names: &[&str]) -> MemFs {
    let files: Vec<(String, String)> = names
        .iter()
        .map(|n| (format!("etc/{n}"), format!("template {n}")))
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    MemFs::with_files(&refs)
}

#[test]
fn test_ensure_directory_is_idempotent() {
    let fs = MemFs::default();
    ensure_directory(&fs, Path::new("deployment-cloud-team")).unwrap();
    ensure_directory(&fs, Path::new("deployment-cloud-team")).unwrap();
    assert_eq!(fs.ops(), vec!["mkdir deployment-cloud-team"]);
}

#[test]
fn test_local_templates_are_copied() {
    let fs = templates_fs(LOCAL_TEMPLATES);
    let config = local_with(&[]);

    let dir = prepare_templates(&fs, &config, Path::new("etc")).unwrap();

    assert_eq!(dir, PathBuf::from("deployment-local-25.06"));
    assert_eq!(
        fs.file("deployment-local-25.06/compose.yaml").as_deref(),
        Some("template compose.yaml")
    );
    assert!(fs.file("deployment-local-25.06/main.tf").is_none());
}

#[test]
fn test_cloud_templates_overwrite_existing_copies() {
    let fs = templates_fs(CLOUD_TEMPLATES);
    fs.files
        .lock()
        .unwrap()
        .insert(PathBuf::from("deployment-cloud-team/main.tf"), "stale".into());

    prepare_templates(&fs, &cloud_with(&[]), Path::new("etc")).unwrap();

    assert_eq!(
        fs.file("deployment-cloud-team/main.tf").as_deref(),
        Some("template main.tf")
    );
    for name in CLOUD_TEMPLATES {
        assert!(fs.file(&format!("deployment-cloud-team/{name}")).is_some());
    }
}

#[test]
fn test_missing_template_is_an_error() {
    let fs = MemFs::default();
    let err = prepare_templates(&fs, &local_with(&[]), Path::new("etc")).unwrap_err();
    assert!(format!("{err:#}").contains("copying template compose.yaml"));
}

#[test]
fn test_persist_writes_config_with_restricted_mode() {
    let fs = MemFs::default();
    let config = cloud_with(&[]);

    let dir = persist(&fs, &config).unwrap();

    assert_eq!(dir, PathBuf::from("deployment-cloud-team"));
    let text = fs.file("deployment-cloud-team/config").unwrap();
    assert!(text.starts_with("# Open Targets cloud deployment config for https://team.dev.opentargets.xyz\n"));
    let parsed = envfile::parse(&text).unwrap();
    assert_eq!(parsed["OT_DEPLOYMENT_TYPE"], "cloud");
    assert_eq!(parsed["TF_VAR_OT_GCP_PROJECT"], "open-targets-eu-dev");
    assert_eq!(fs.mode("deployment-cloud-team/config"), Some(CONFIG_MODE));
}

#[test]
fn test_secret_is_restricted_before_value_is_written() {
    let fs = MemFs::default();
    let config = local_with(&[(API_AI_TOKEN, "sk-123")]);

    persist(&fs, &config).unwrap();

    let secret = "deployment-local-25.06/openai_token";
    let secret_ops: Vec<String> = fs
        .ops()
        .into_iter()
        .filter(|op| op.contains(secret))
        .collect();
    assert_eq!(
        secret_ops,
        vec![
            format!("write {secret} "),
            format!("chmod {secret} 600"),
            format!("write {secret} sk-123"),
        ]
    );
    assert_eq!(fs.mode(secret), Some(SECRET_MODE));

    let text = fs.file("deployment-local-25.06/config").unwrap();
    assert!(!text.contains("sk-123"));
    assert!(text.contains("# OT_API_AI_TOKEN is a secret located at ./openai_token"));
}
