//! The render pipeline
//!
//! ```text
//! cache hit? ──yes──> result
//!     │ no
//! normalize -> fetch -> load -> resolve values -> render -> decode -> store -> result
//! ```
//!
//! Any stage failing stops the pipeline and returns that stage's error.

use packrender_core::{Capabilities, ReleaseInfo, TemplateContext};
use packrender_engine::Engine;
use packrender_kube::{ManifestDecoder, RenderResult};
use packrender_repo::{CacheLookup, FetcherFactory, ManifestCache, SourceIdentifier, normalize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::options::RenderOptions;

/// Cache-aside renderer: fetches, renders and decodes a pack, or serves a
/// previous result for the same source.
pub struct Renderer {
    factory: Arc<dyn FetcherFactory>,
    cache: Option<Arc<dyn ManifestCache>>,
    decoder: ManifestDecoder,
}

impl Renderer {
    pub fn new(factory: impl FetcherFactory + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            cache: None,
            decoder: ManifestDecoder::default(),
        }
    }

    /// Without a cache every lookup misses and nothing is stored
    pub fn with_cache(mut self, cache: Arc<dyn ManifestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_decoder(mut self, decoder: ManifestDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Render `source` into resource objects.
    ///
    /// The cache is keyed by `source` as given. `options.git` only changes
    /// what is fetched, so renders with different git options share an entry.
    /// `working_path` receives the pack and must not be shared with a
    /// concurrent render.
    pub async fn render(
        &self,
        source: &SourceIdentifier,
        options: &RenderOptions,
        working_path: &Path,
    ) -> Result<RenderResult> {
        if let CacheLookup::Hit(result) = self.lookup(source) {
            tracing::debug!(%source, resources = result.len(), "cache hit");
            return Ok(result);
        }
        tracing::debug!(%source, "cache miss");

        let fetch_source = normalize(source, &options.git);
        let fetcher = self.factory.create(&fetch_source, working_path)?;
        fetcher.fetch().await?;
        tracing::debug!(%source, path = %working_path.display(), "fetched pack");

        let result = self.render_local(options, working_path)?;

        if let Some(cache) = &self.cache
            && let Err(e) = cache.store(source, &result)
        {
            tracing::warn!(%source, "failed to cache rendered manifests: {}", e);
        }

        tracing::info!(%source, resources = result.len(), "rendered pack");
        Ok(result)
    }

    /// Load, render and decode a pack already present at `path`. No cache.
    pub fn render_local(&self, options: &RenderOptions, path: &Path) -> Result<RenderResult> {
        let (pack, defaults) = packrender_core::load(path)?;
        let values = packrender_core::resolve_parameters(&pack, &defaults, &options.values)?;

        let release = ReleaseInfo::for_install(&options.release_name, &options.namespace);
        let mut context = TemplateContext::new(values, release, &pack.pack.metadata);
        if let Some(version) = &options.kube_version {
            context = context.with_capabilities(Capabilities::for_version(version));
        }

        let documents = Engine::new(pack.pack.engine.strict).render_pack(&pack, &context)?;
        tracing::debug!(pack = pack.name(), documents = documents.len(), "rendered templates");

        Ok(self.decoder.decode(&documents)?)
    }

    fn lookup(&self, source: &SourceIdentifier) -> CacheLookup {
        self.cache
            .as_ref()
            .map_or(CacheLookup::Miss, |cache| cache.lookup(source))
    }
}
