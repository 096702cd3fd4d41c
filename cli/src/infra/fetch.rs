//! `ArchiveFetcher` adapter: streaming HTTP downloads and tar.gz extraction.
//!
//! Both operations write to a sibling scratch location and rename into
//! place, so an interrupted run never leaves a half-written destination.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::application::ports::ArchiveFetcher;
use crate::domain::StorageUri;

/// Archive fetcher over HTTPS. `gs://` sources are read through the public
/// storage endpoint.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("platform-deploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http })
    }
}

/// HTTPS location for `url`.
///
/// # Errors
///
/// Returns an error for a malformed `gs://` reference.
pub fn download_url(url: &str) -> Result<String> {
    if StorageUri::is_remote(url) {
        return Ok(StorageUri::parse_object(url)?.public_url());
    }
    Ok(url.to_string())
}

/// `<dest>.part`
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

/// Unpack a gzipped tarball into a fresh directory `dest`.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or `dest` cannot be
/// created.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    let scratch = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(parent)
        .with_context(|| format!("creating scratch directory in {}", parent.display()))?;

    let file = std::fs::File::open(archive)
        .with_context(|| format!("opening archive {}", archive.display()))?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    tar.unpack(scratch.path())
        .with_context(|| format!("unpacking {}", archive.display()))?;

    // scratch directories are created 0700
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(scratch.path(), std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("setting permissions on {}", scratch.path().display()))?;
    }

    std::fs::rename(scratch.path(), dest)
        .with_context(|| format!("moving extracted data to {}", dest.display()))?;
    Ok(())
}

impl ArchiveFetcher for HttpFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let url = download_url(url)?;
        let partial = partial_path(dest);
        tracing::info!(%url, dest = %dest.display(), "downloading");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("{url} returned {status}");
        }

        let mut file = tokio::fs::File::create(&partial)
            .await
            .with_context(|| format!("creating {}", partial.display()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("reading {url}"))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("writing {}", partial.display()))?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, dest)
            .await
            .with_context(|| format!("finalizing {}", dest.display()))?;
        Ok(())
    }

    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let (archive, dest) = (archive.to_path_buf(), dest.to_path_buf());
        tracing::info!(archive = %archive.display(), dest = %dest.display(), "extracting");
        tokio::task::spawn_blocking(move || unpack(&archive, &dest))
            .await
            .context("extraction task panicked")?
    }
}
