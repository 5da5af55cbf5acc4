//! packrender pipeline: source in, Kubernetes objects out
//!
//! [`Renderer`] checks a [`ManifestCache`](packrender_repo::ManifestCache)
//! first and only fetches, renders and decodes on a miss.
//!
//! ```rust,no_run
//! use packrender_pipeline::{RenderOptions, Renderer};
//! use packrender_repo::{DefaultFetcherFactory, GitOptions, MemoryCache};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = Renderer::new(DefaultFetcherFactory::new())
//!     .with_cache(Arc::new(MemoryCache::new()));
//!
//! let options = RenderOptions::default()
//!     .with_git(GitOptions::default().with_branch("main").with_subpath("web"));
//!
//! let resources = renderer
//!     .render(&"git@example.com:org/packs.git".into(), &options, "/tmp/web".as_ref())
//!     .await?;
//! for resource in &resources {
//!     println!("{}", resource.display_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod options;
pub mod pipeline;

pub use error::{RenderError, RenderErrorKind, Result};
pub use options::{DEFAULT_NAMESPACE, DEFAULT_RELEASE_NAME, RenderOptions};
pub use pipeline::Renderer;
