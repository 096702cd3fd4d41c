//! Local deployment: cached data fetch, ordering and compose invocation.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use platform_deploy::application::ports::UpOptions;
use platform_deploy::application::services::deploy::{
    LocalDeployment, data_archives, deploy_local, destroy_local,
};
use platform_deploy::domain::ProvisioningError;

use crate::helpers::local;
use crate::mocks::{MemFs, MockCompose, MockFetcher, RecordingReporter};

const DIR: &str = "deployment-local-25.06";
const BASE: &str = "https://ftp.ebi.ac.uk/pub/databases/opentargets/platform/25.06/disk_images";

async fn run(fetcher: &MockFetcher, compose: &MockCompose, fs: &MemFs) -> anyhow::Result<()> {
    let config = local();
    deploy_local(
        fetcher,
        compose,
        fs,
        &RecordingReporter::default(),
        &LocalDeployment {
            config: &config,
            deployment_dir: Path::new(DIR),
            downloads: Path::new("downloads"),
        },
    )
    .await
}

#[test]
fn test_data_archives_layout() {
    let [ch, os] = data_archives(&local(), Path::new("downloads"), Path::new(DIR));

    assert_eq!(ch.url, format!("{BASE}/clickhouse.tgz"));
    assert_eq!(ch.archive, PathBuf::from("downloads/clickhouse-25.06.tgz"));
    assert_eq!(ch.target, PathBuf::from("deployment-local-25.06/clickhouse"));
    assert_eq!(os.name, "opensearch");
}

#[tokio::test]
async fn test_fresh_deploy_downloads_then_extracts_then_starts() {
    let fetcher = MockFetcher::default();
    let compose = MockCompose::default();
    let fs = MemFs::default();

    run(&fetcher, &compose, &fs).await.unwrap();

    assert_eq!(
        fetcher.events(),
        vec![
            format!("download {BASE}/clickhouse.tgz"),
            format!("download {BASE}/opensearch.tgz"),
            "extract downloads/clickhouse-25.06.tgz".to_string(),
            "extract downloads/opensearch-25.06.tgz".to_string(),
        ]
    );
    let ups = compose.ups.lock().unwrap();
    assert_eq!(
        *ups,
        vec![(
            PathBuf::from("deployment-local-25.06/compose.yaml"),
            UpOptions {
                force_recreate: true,
                build: true,
            }
        )]
    );
    assert!(fs.ops().contains(&"mkdir downloads".to_string()));
}

#[tokio::test]
async fn test_cached_archive_is_not_downloaded_again() {
    let fetcher = MockFetcher::default();
    let fs = MemFs::with_files(&[("downloads/clickhouse-25.06.tgz", "cached")]);

    run(&fetcher, &MockCompose::default(), &fs).await.unwrap();

    let events = fetcher.events();
    assert!(
        !events
            .iter()
            .any(|e| e.starts_with("download ") && e.contains("clickhouse"))
    );
    assert!(events.contains(&format!("download {BASE}/opensearch.tgz")));
    assert!(events.contains(&"extract downloads/clickhouse-25.06.tgz".to_string()));
}

#[tokio::test]
async fn test_present_data_directory_is_not_extracted_again() {
    let fetcher = MockFetcher::default();
    let fs = MemFs::with_files(&[
        ("downloads/clickhouse-25.06.tgz", "cached"),
        ("downloads/opensearch-25.06.tgz", "cached"),
        ("deployment-local-25.06/opensearch", ""),
    ]);

    run(&fetcher, &MockCompose::default(), &fs).await.unwrap();

    assert_eq!(
        fetcher.events(),
        vec!["extract downloads/clickhouse-25.06.tgz"]
    );
}

#[tokio::test]
async fn test_download_failure_aborts_before_extract_and_compose() {
    let fetcher = MockFetcher::failing_on(&["clickhouse.tgz"]);
    let compose = MockCompose::default();

    let err = run(&fetcher, &compose, &MemFs::default()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ProvisioningError>(),
        Some(ProvisioningError::Fetch { item, .. }) if item == "clickhouse"
    ));
    assert!(fetcher.events().iter().all(|e| e.starts_with("download")));
    assert_eq!(fetcher.events().len(), 2);
    assert!(compose.ups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_first_of_two_failures_is_returned() {
    let fetcher = MockFetcher::failing_on(&["clickhouse.tgz", "opensearch.tgz"]);

    let err = run(&fetcher, &MockCompose::default(), &MemFs::default())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("fetching clickhouse data failed"));
}

#[tokio::test]
async fn test_extract_failure_stops_compose() {
    let fetcher = MockFetcher::failing_on(&["opensearch-25.06.tgz"]);
    let compose = MockCompose::default();

    let err = run(&fetcher, &compose, &MemFs::default()).await.unwrap_err();

    assert!(err.to_string().contains("extract"));
    assert!(compose.ups.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_destroy_local_brings_compose_down() {
    let compose = MockCompose::default();
    let reporter = RecordingReporter::default();

    destroy_local(&compose, &reporter, Path::new(DIR))
        .await
        .unwrap();

    assert_eq!(
        *compose.downs.lock().unwrap(),
        vec![PathBuf::from("deployment-local-25.06/compose.yaml")]
    );
    assert_eq!(
        reporter.messages().last().unwrap(),
        "ok: local deployment deployment-local-25.06 destroyed"
    );
}
