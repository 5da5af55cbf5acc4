//! The acquisition seam: fetchers and the factory that builds them

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};
use crate::git::GitFetcher;
use crate::http::HttpFetcher;
use crate::local::LocalFetcher;
use crate::source::{SourceIdentifier, SourceKind};

/// Materializes a pack at a local path.
///
/// A fetcher is bound to one (parameterized) source and one destination when
/// it is built; `fetch` takes no arguments and does no rendering.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<()>;

    fn source(&self) -> &SourceIdentifier;

    fn destination(&self) -> &Path;
}

/// Builds the fetcher for a source
pub trait FetcherFactory: Send + Sync {
    fn create(&self, source: &SourceIdentifier, destination: &Path) -> Result<Box<dyn Fetcher>>;
}

impl<F> FetcherFactory for F
where
    F: Fn(&SourceIdentifier, &Path) -> Result<Box<dyn Fetcher>> + Send + Sync,
{
    fn create(&self, source: &SourceIdentifier, destination: &Path) -> Result<Box<dyn Fetcher>> {
        self(source, destination)
    }
}

/// Picks the fetcher from [`SourceKind`]
#[derive(Debug, Clone)]
pub struct DefaultFetcherFactory {
    /// Base for relative local paths
    working_dir: PathBuf,
    bearer_token: Option<String>,
    git_binary: String,
}

impl Default for DefaultFetcherFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultFetcherFactory {
    pub fn new() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            bearer_token: None,
            git_binary: "git".to_string(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Token sent to HTTP sources as `Authorization: Bearer`
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }
}

impl FetcherFactory for DefaultFetcherFactory {
    fn create(&self, source: &SourceIdentifier, destination: &Path) -> Result<Box<dyn Fetcher>> {
        let kind = source.kind();
        tracing::debug!(%source, %kind, destination = %destination.display(), "creating fetcher");

        match kind {
            SourceKind::Git => Ok(Box::new(
                GitFetcher::new(source.clone(), destination)?.with_git_binary(&self.git_binary),
            )),
            SourceKind::Http => {
                let mut fetcher = HttpFetcher::new(source.clone(), destination)?;
                if let Some(token) = &self.bearer_token {
                    fetcher = fetcher.with_bearer_token(token);
                }
                Ok(Box::new(fetcher))
            }
            SourceKind::Local => Ok(Box::new(LocalFetcher::new(
                source.clone(),
                destination,
                &self.working_dir,
            ))),
        }
    }
}

/// Refusal for a source a fetcher cannot handle
pub(crate) fn unsupported(source: &SourceIdentifier, reason: &str) -> FetchError {
    FetchError::InvalidSource {
        source_location: source.to_string(),
        reason: reason.to_string(),
    }
}
