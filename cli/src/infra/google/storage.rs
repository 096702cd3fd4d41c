//! `ObjectStore` over the Cloud Storage JSON API.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ObjectStore};
use crate::domain::StorageUri;

use super::{GoogleCloud, api_url};

const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1";
const UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";

/// One page of an object listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPage {
    #[serde(default)]
    pub items: Vec<ObjectItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectItem {
    pub name: String,
}

impl<R: CommandRunner> GoogleCloud<R> {
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let token = self.token.get().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("unable to access google cloud while {what}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{what} failed with {status}: {}", body.trim());
        }
        Ok(response)
    }
}

impl<R: CommandRunner> ObjectStore for GoogleCloud<R> {
    async fn read(&self, uri: &StorageUri) -> Result<Vec<u8>> {
        let mut url = api_url(STORAGE_API, &["b", &uri.bucket, "o", &uri.path])?;
        url.query_pairs_mut().append_pair("alt", "media");
        let what = format!("reading {uri}");
        let response = self.send(self.http.get(url), &what).await?;
        let bytes = response.bytes().await.with_context(|| what.clone())?;
        tracing::debug!(%uri, size = bytes.len(), "read object");
        Ok(bytes.to_vec())
    }

    async fn write(&self, uri: &StorageUri, bytes: Vec<u8>) -> Result<()> {
        let mut url = api_url(UPLOAD_API, &["b", &uri.bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &uri.path);
        let request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(bytes);
        self.send(request, &format!("writing {uri}")).await?;
        tracing::debug!(%uri, "wrote object");
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = api_url(STORAGE_API, &["b", bucket, "o"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", prefix).append_pair("fields", "items(name),nextPageToken");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let what = format!("listing gs://{bucket}/{prefix}");
            let page: ObjectPage = self
                .send(self.http.get(url), &what)
                .await?
                .json()
                .await
                .with_context(|| format!("decoding listing of gs://{bucket}"))?;
            names.extend(page.items.into_iter().map(|item| item.name));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(names)
    }
}
