//! Render command - fetch a pack and print its Kubernetes objects

use clap::{Args, ValueEnum};
use packrender_core::Values;
use packrender_kube::RenderResult;
use packrender_pipeline::{RenderOptions, Renderer};
use packrender_repo::{DefaultFetcherFactory, GitOptions, ManifestCache, MemoryCache, SqliteCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackend {
    /// Persistent cache under the user cache directory
    Sqlite,
    /// Lives for this invocation only
    Memory,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON array
    Json,
    /// Multi-document YAML
    Yaml,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Pack source: local path, http(s) archive URL or git remote
    pub source: String,

    /// Directory inside the source holding the pack
    #[arg(long)]
    pub subpath: Option<String>,

    /// Branch or tag to check out (git sources)
    #[arg(long)]
    pub branch: Option<String>,

    /// Base64 encoded private SSH key (git sources)
    #[arg(long, env = "PACKRENDER_SSH_KEY", hide_env_values = true)]
    pub sshkey: Option<String>,

    /// Bearer token for HTTP sources
    #[arg(long, env = "PACKRENDER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Values file(s) to merge
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Set values on command line (key=value)
    #[arg(long = "set")]
    pub set: Vec<String>,

    /// Release name (for template context)
    #[arg(long, default_value = packrender_pipeline::DEFAULT_RELEASE_NAME)]
    pub release_name: String,

    /// Target namespace
    #[arg(short, long, default_value = packrender_pipeline::DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Kubernetes version exposed as capabilities.kubeVersion
    #[arg(long)]
    pub kube_version: Option<String>,

    /// Manifest cache, keyed by source only
    #[arg(long, value_enum, default_value_t = CacheBackend::None)]
    pub cache: CacheBackend,

    /// SQLite cache file
    #[arg(long, env = "PACKRENDER_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Working directory for the fetched pack (default: fresh temp dir)
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

pub async fn run(args: RenderArgs) -> Result<()> {
    let options = RenderOptions {
        git: GitOptions {
            subpath: args.subpath.clone(),
            branch: args.branch.clone(),
            credential: args.sshkey.clone(),
        },
        values: overlay_values(&args.values, &args.set)?,
        release_name: args.release_name.clone(),
        namespace: args.namespace.clone(),
        kube_version: args.kube_version.clone(),
    };

    let mut factory = DefaultFetcherFactory::new();
    if let Some(token) = &args.token {
        factory = factory.with_bearer_token(token);
    }

    let mut renderer = Renderer::new(factory);
    if args.cache != CacheBackend::None && customizes_render(&options) {
        tracing::warn!("values or release options given, rendering without the manifest cache");
    } else if let Some(cache) = open_cache(args.cache, args.cache_path.as_deref()) {
        renderer = renderer.with_cache(cache);
    }

    // Keep the temp dir alive until rendering is done
    let scratch;
    let working_path = match &args.workdir {
        Some(dir) => dir.clone(),
        None => {
            scratch = tempfile::Builder::new().prefix("packrender-").tempdir()?;
            scratch.path().join("pack")
        }
    };

    let result = renderer
        .render(&args.source.as_str().into(), &options, &working_path)
        .await?;

    print!("{}", format_result(&result, args.output)?);
    Ok(())
}

/// `-f` files in order, then `--set` on top
fn overlay_values(files: &[PathBuf], set: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for file in files {
        let file_values = Values::from_file(file).map_err(|e| {
            CliError::input(format!("Failed to load values file {}: {}", file.display(), e))
        })?;
        values.merge(&file_values);
    }

    if !set.is_empty() {
        let set_values = Values::from_set_args(set).map_err(|e| CliError::input(e.to_string()))?;
        values.merge(&set_values);
    }

    Ok(values)
}

/// Cache entries only describe renders with default values and release
fn customizes_render(options: &RenderOptions) -> bool {
    !options.values.is_empty()
        || options.release_name != packrender_pipeline::DEFAULT_RELEASE_NAME
        || options.namespace != packrender_pipeline::DEFAULT_NAMESPACE
        || options.kube_version.is_some()
}

/// A cache that fails to open is skipped, not fatal
fn open_cache(backend: CacheBackend, path: Option<&Path>) -> Option<Arc<dyn ManifestCache>> {
    match backend {
        CacheBackend::None => None,
        CacheBackend::Memory => Some(Arc::new(MemoryCache::new())),
        CacheBackend::Sqlite => {
            let opened = match path {
                Some(path) => SqliteCache::open_at(path),
                None => SqliteCache::open(),
            };
            match opened {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    tracing::warn!("manifest cache unavailable, rendering without it: {}", e);
                    None
                }
            }
        }
    }
}

fn format_result(result: &RenderResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map(|json| json + "\n")
            .map_err(|e| CliError::input(e.to_string())),
        OutputFormat::Yaml => {
            let mut out = String::new();
            for resource in result {
                let doc = serde_yaml::to_string(resource).map_err(|e| CliError::input(e.to_string()))?;
                out.push_str("---\n");
                out.push_str(&doc);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrender_kube::ResourceObject;

    #[test]
    fn test_overlay_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prod.yaml");
        std::fs::write(&file, "replicas: 3\nimage:\n  tag: v1\n").unwrap();

        let values = overlay_values(&[file], &["image.tag=v2".to_string()]).unwrap();
        assert_eq!(values.get("replicas").unwrap(), 3);
        assert_eq!(values.get("image.tag").unwrap(), "v2");
    }

    #[test]
    fn test_bad_set_is_input_error() {
        let err = overlay_values(&[], &["novalue".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
    }

    #[test]
    fn test_yaml_output_is_multi_document() {
        let result = vec![
            ResourceObject::new("v1", "ConfigMap", "a"),
            ResourceObject::new("v1", "ConfigMap", "b"),
        ];
        let out = format_result(&result, OutputFormat::Yaml).unwrap();
        assert_eq!(out.matches("---\n").count(), 2);
        assert!(out.contains("kind: ConfigMap"));
    }

    #[test]
    fn test_customized_render_detection() {
        assert!(!customizes_render(&RenderOptions::default()));
        assert!(customizes_render(
            &RenderOptions::default().with_values(Values::from_yaml("replicaCount: 4").unwrap())
        ));
        assert!(customizes_render(&RenderOptions::default().with_release("shop", "default")));
        assert!(customizes_render(&RenderOptions::default().with_kube_version("1.31.0")));
    }

    #[test]
    fn test_memory_cache_backend() {
        assert!(open_cache(CacheBackend::None, None).is_none());
        assert!(open_cache(CacheBackend::Memory, None).is_some());
    }
}
