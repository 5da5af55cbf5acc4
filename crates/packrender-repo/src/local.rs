//! Local directory sources

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};
use crate::fetcher::Fetcher;
use crate::source::SourceIdentifier;

/// Copies a pack directory from the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    source: SourceIdentifier,
    root: PathBuf,
    destination: PathBuf,
}

impl LocalFetcher {
    /// Relative sources resolve against `working_dir`
    pub fn new(source: SourceIdentifier, destination: &Path, working_dir: &Path) -> Self {
        let parts = source.split_query().with_subdir_split();
        let location = parts
            .location
            .strip_prefix("file://")
            .unwrap_or(&parts.location);

        let mut root = PathBuf::from(location);
        if root.is_relative() {
            root = working_dir.join(root);
        }
        if let Some(subdir) = &parts.subdir {
            root = root.join(subdir);
        }

        Self {
            source,
            root,
            destination: destination.to_path_buf(),
        }
    }

    /// Resolved directory that will be copied
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(FetchError::SourceNotFound {
                source_path: self.root.display().to_string(),
            });
        }

        tracing::debug!(from = %self.root.display(), to = %self.destination.display(), "copying local pack");

        let (from, to) = (self.root.clone(), self.destination.clone());
        tokio::task::spawn_blocking(move || copy_dir(&from, &to))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))??;
        Ok(())
    }

    fn source(&self) -> &SourceIdentifier {
        &self.source
    }

    fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Recursively copy `from` into `to`, skipping `.git`
pub(crate) fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;

    let walker = walkdir::WalkDir::new(from)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry?;
        let rel = entry.path().strip_prefix(from).map_err(std::io::Error::other)?;
        let target = to.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_copies_tree() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("templates")).unwrap();
        fs::create_dir_all(src.path().join(".git")).unwrap();
        fs::write(src.path().join("Pack.yaml"), "x").unwrap();
        fs::write(src.path().join("templates/a.yaml"), "y").unwrap();
        fs::write(src.path().join(".git/HEAD"), "ref").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let dest = dst.path().join("work");
        let source = SourceIdentifier::new(src.path().display().to_string());

        let fetcher = LocalFetcher::new(source, &dest, Path::new("/"));
        fetcher.fetch().await.unwrap();

        assert_eq!(fs::read_to_string(dest.join("templates/a.yaml")).unwrap(), "y");
        assert!(dest.join("Pack.yaml").is_file());
        assert!(!dest.join(".git").exists());
    }

    #[tokio::test]
    async fn test_relative_source_and_subdir() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(base.path().join("packs/web")).unwrap();
        fs::write(base.path().join("packs/web/Pack.yaml"), "x").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new("packs//web".into(), dst.path(), base.path());
        assert_eq!(fetcher.root(), base.path().join("packs").join("web"));

        fetcher.fetch().await.unwrap();
        assert!(dst.path().join("Pack.yaml").is_file());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dst = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher::new("./wrong-path".into(), dst.path(), Path::new("/nonexistent"));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::SourceNotFound { .. }));
    }
}
