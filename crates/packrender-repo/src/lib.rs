//! packrender repo: where packs come from and where renders are kept
//!
//! - **Sources**: [`SourceIdentifier`] plus [`normalize`], which applies
//!   [`GitOptions`] (subpath, branch, SSH key) without touching the original
//! - **Fetchers**: local directories, HTTP(S) archives and git remotes behind
//!   the [`Fetcher`] trait, built by a [`FetcherFactory`]
//! - **Caches**: [`ManifestCache`] with in-memory and SQLite backends
//!
//! ```rust,no_run
//! use packrender_repo::{DefaultFetcherFactory, FetcherFactory, GitOptions, normalize};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = GitOptions::default().with_branch("main").with_subpath("web");
//! let source = normalize(&"git@example.com:org/packs.git".into(), &options);
//!
//! let fetcher = DefaultFetcherFactory::new().create(&source, Path::new("/tmp/web"))?;
//! fetcher.fetch().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod git;
pub mod http;
pub mod local;
pub mod source;
pub mod sqlite;

pub use cache::{CacheCounts, CacheLookup, ManifestCache, MemoryCache};
pub use error::{CacheError, FetchError, Result};
pub use fetcher::{DefaultFetcherFactory, Fetcher, FetcherFactory};
pub use git::GitFetcher;
pub use http::HttpFetcher;
pub use local::LocalFetcher;
pub use source::{GIT_FORCE_PREFIX, GitOptions, SourceIdentifier, SourceKind, SourceParts, normalize};
pub use sqlite::{CacheStats, SqliteCache};
