//! HTTP(S) archive sources
//!
//! The source points at a `.tar.gz`/`.tgz` pack archive. An optional
//! `checksum=sha256:<hex>` query parameter is verified before extraction.

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};
use crate::fetcher::{Fetcher, unsupported};
use crate::local::copy_dir;
use crate::source::SourceIdentifier;

pub struct HttpFetcher {
    source: SourceIdentifier,
    url: url::Url,
    checksum: Option<String>,
    subdir: Option<String>,
    bearer_token: Option<String>,
    destination: PathBuf,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(source: SourceIdentifier, destination: &Path) -> Result<Self> {
        let parts = source.split_query().with_subdir_split();
        let url = url::Url::parse(&parts.location)
            .map_err(|e| unsupported(&source, &format!("invalid URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            url,
            checksum: parts.checksum,
            subdir: parts.subdir,
            bearer_token: None,
            destination: destination.to_path_buf(),
            client,
            source,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<()> {
        tracing::debug!(url = %self.url, "downloading pack archive");
        let data = self.download().await?;

        if let Some(expected) = &self.checksum {
            let actual = compute_digest(&data);
            if !digest_matches(expected, &actual) {
                return Err(FetchError::ChecksumMismatch {
                    url: self.url.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let (subdir, destination) = (self.subdir.clone(), self.destination.clone());
        tokio::task::spawn_blocking(move || install_archive(&data, subdir.as_deref(), &destination))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))?
    }

    fn source(&self) -> &SourceIdentifier {
        &self.source
    }

    fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Unpack into a staging directory, then copy the pack root to `destination`.
///
/// A lone top-level directory in the archive (`web/Pack.yaml`) is treated as
/// the pack root.
fn install_archive(data: &[u8], subdir: Option<&str>, destination: &Path) -> Result<()> {
    let staging = tempfile::tempdir()?;

    let gz = flate2::read::GzDecoder::new(Cursor::new(data));
    tar::Archive::new(gz)
        .unpack(staging.path())
        .map_err(|e| FetchError::Archive {
            message: e.to_string(),
        })?;

    let mut root = single_child_dir(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf());
    if let Some(subdir) = subdir {
        root = root.join(subdir);
        if !root.is_dir() {
            return Err(FetchError::SourceNotFound {
                source_path: format!("{} in archive", subdir),
            });
        }
    }

    copy_dir(&root, destination)?;
    Ok(())
}

fn single_child_dir(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    let [only] = entries.as_slice() else {
        return Ok(None);
    };
    Ok(only.file_type()?.is_dir().then(|| only.path()))
}

fn compute_digest(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

/// Compare digests written as `sha256:<hex>`, `sha256-<hex>` or bare hex
fn digest_matches(expected: &str, actual: &str) -> bool {
    fn normalized(digest: &str) -> String {
        let digest = digest.trim().to_lowercase();
        digest
            .strip_prefix("sha256:")
            .or_else(|| digest.strip_prefix("sha256-"))
            .unwrap_or(&digest)
            .to_string()
    }
    normalized(expected) == normalized(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_digest() {
        let digest = compute_digest(b"hello world");
        assert_eq!(
            digest,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_digest_matches() {
        assert!(digest_matches("sha256:ABC123", "sha256:abc123"));
        assert!(digest_matches("abc123", "sha256:abc123"));
        assert!(digest_matches("sha256-abc123", "sha256:abc123"));
        assert!(!digest_matches("sha256:abc123", "sha256:def456"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = HttpFetcher::new("https://".into(), Path::new("/tmp/x")).err().unwrap();
        assert!(matches!(err, FetchError::InvalidSource { .. }));
    }

    #[test]
    fn test_query_parameters_are_not_part_of_url() {
        let fetcher = HttpFetcher::new(
            "https://charts.example/web.tgz?checksum=sha256:abc".into(),
            Path::new("/tmp/x"),
        )
        .unwrap();
        assert_eq!(fetcher.url().as_str(), "https://charts.example/web.tgz");
        assert_eq!(fetcher.checksum.as_deref(), Some("sha256:abc"));
    }
}
