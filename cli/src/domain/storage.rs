//! Object-store references (`gs://bucket/path`) and the provisioning backend
//! coordinates derived from them.

use std::fmt;

use crate::domain::error::UriError;

/// Scheme prefix for Google Cloud Storage URIs.
pub const GCS_SCHEME: &str = "gs://";

/// A parsed `gs://bucket[/path]` reference. `path` has no leading or trailing
/// slash and may be empty for a bucket-level reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub bucket: String,
    pub path: String,
}

impl StorageUri {
    /// Parse a reference that may point at a bucket root.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is not `gs://` or the bucket is empty.
    pub fn parse(raw: &str) -> Result<Self, UriError> {
        let rest = raw
            .strip_prefix(GCS_SCHEME)
            .ok_or_else(|| UriError::Scheme(raw.to_string()))?;
        let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(UriError::MissingBucket(raw.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            path: path.trim_matches('/').to_string(),
        })
    }

    /// Parse a reference that must name an object (or object prefix).
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid or has no object part.
    pub fn parse_object(raw: &str) -> Result<Self, UriError> {
        let uri = Self::parse(raw)?;
        if uri.path.is_empty() {
            return Err(UriError::MissingObject(raw.to_string()));
        }
        Ok(uri)
    }

    /// `true` when `raw` uses the object-store scheme.
    #[must_use]
    pub fn is_remote(raw: &str) -> bool {
        raw.starts_with(GCS_SCHEME)
    }

    /// A child reference `self/name`.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let name = name.trim_matches('/');
        let path = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.path)
        };
        Self {
            bucket: self.bucket.clone(),
            path,
        }
    }

    /// Provisioning backend coordinates for this reference.
    #[must_use]
    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            bucket: self.bucket.clone(),
            prefix: self.path.clone(),
        }
    }

    /// Public HTTPS download URL for this object.
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("https://storage.googleapis.com/{}/{}", self.bucket, self.path)
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{GCS_SCHEME}{}", self.bucket)
        } else {
            write!(f, "{GCS_SCHEME}{}/{}", self.bucket, self.path)
        }
    }
}

/// Remote state backend the provisioning tool is initialised against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub bucket: String,
    pub prefix: String,
}
