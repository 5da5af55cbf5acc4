//! Git sources
//!
//! Clones with the system `git` binary. `ref` selects the branch, tag or
//! commit and `sshkey` carries a base64 encoded private key for SSH remotes.

use async_trait::async_trait;
use base64::Engine as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::{FetchError, Result};
use crate::fetcher::{Fetcher, unsupported};
use crate::local::copy_dir;
use crate::source::{GIT_FORCE_PREFIX, SourceIdentifier};

#[derive(Debug, Clone)]
pub struct GitFetcher {
    source: SourceIdentifier,
    repository: String,
    reference: Option<String>,
    sshkey: Option<String>,
    subdir: Option<String>,
    destination: PathBuf,
    git_binary: String,
}

impl GitFetcher {
    pub fn new(source: SourceIdentifier, destination: &Path) -> Result<Self> {
        let parts = source.split_query().with_subdir_split();
        let location = parts
            .location
            .strip_prefix(GIT_FORCE_PREFIX)
            .unwrap_or(&parts.location);

        // `repo.git/sub/dir` is the single-slash form of a subdirectory
        let (repository, subdir) = match (parts.subdir, location.split_once(".git/")) {
            (Some(subdir), _) => (location.to_string(), Some(subdir)),
            (None, Some((repo, rest))) => (format!("{}.git", repo), Some(rest.trim_matches('/').to_string())),
            (None, None) => (location.to_string(), None),
        };

        if repository.is_empty() {
            return Err(unsupported(&source, "empty git repository"));
        }

        Ok(Self {
            repository,
            reference: parts.reference,
            sshkey: parts.sshkey,
            subdir: subdir.filter(|s| !s.is_empty()),
            destination: destination.to_path_buf(),
            git_binary: "git".to_string(),
            source,
        })
    }

    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }

    /// Remote passed to `git clone`
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    /// Write the decoded key to a private temp file; it lives as long as the handle
    fn write_key(&self, encoded: &str) -> Result<tempfile::NamedTempFile> {
        let key = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| unsupported(&self.source, &format!("sshkey is not valid base64: {}", e)))?;

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&key)?;
        file.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(file)
    }

    /// Run one git command, mapping a non-zero exit to its stderr
    async fn git(&self, args: &[&str], key_file: Option<&Path>) -> Result<()> {
        let mut cmd = Command::new(&self.git_binary);
        cmd.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(key_file) = key_file {
            cmd.env(
                "GIT_SSH_COMMAND",
                format!(
                    "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
                    key_file.display()
                ),
            );
        }

        let output = cmd.output().await.map_err(|e| FetchError::Git {
            message: format!("failed to run {}: {}", self.git_binary, e),
        })?;
        if !output.status.success() {
            return Err(FetchError::Git {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Shallow clone of a branch, a tag or the default head
    async fn clone_ref(&self, dir: &str, reference: Option<&str>, key_file: Option<&Path>) -> Result<()> {
        let mut args = vec!["clone", "--depth", "1"];
        if let Some(reference) = reference {
            args.extend(["--branch", reference]);
        }
        args.extend([self.repository.as_str(), dir]);
        self.git(&args, key_file).await
    }

    /// Shallow fetch of a single commit, which `clone --branch` cannot name
    async fn fetch_commit(&self, dir: &str, reference: &str, key_file: Option<&Path>) -> Result<()> {
        self.git(&["init", "--quiet", dir], None).await?;
        self.git(&["-C", dir, "remote", "add", "origin", self.repository.as_str()], None)
            .await?;
        self.git(&["-C", dir, "fetch", "--depth", "1", "origin", reference], key_file)
            .await?;
        self.git(&["-C", dir, "checkout", "--quiet", "FETCH_HEAD"], None)
            .await
    }
}

/// Abbreviated or full hex object name
fn is_commit_id(reference: &str) -> bool {
    (7..=64).contains(&reference.len()) && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

#[async_trait]
impl Fetcher for GitFetcher {
    async fn fetch(&self) -> Result<()> {
        let checkout = tempfile::tempdir()?;
        let clone_dir = checkout.path().join("repo");
        let dir = clone_dir.to_string_lossy().into_owned();

        let key_file = self.sshkey.as_deref().map(|k| self.write_key(k)).transpose()?;
        let key_path = key_file.as_ref().map(|f| f.path());

        tracing::debug!(repository = %self.repository, reference = ?self.reference, "cloning");

        match self.reference.as_deref() {
            Some(reference) if is_commit_id(reference) => {
                self.fetch_commit(&dir, reference, key_path).await?;
            }
            Some(reference) => {
                if let Err(clone_err) = self.clone_ref(&dir, Some(reference), key_path).await {
                    tracing::debug!(%reference, "clone by name failed, fetching ref directly");
                    if clone_dir.exists() {
                        tokio::fs::remove_dir_all(&clone_dir).await?;
                    }
                    self.fetch_commit(&dir, reference, key_path)
                        .await
                        .map_err(|_| clone_err)?;
                }
            }
            None => self.clone_ref(&dir, None, key_path).await?,
        }

        let root = match &self.subdir {
            Some(subdir) => clone_dir.join(subdir),
            None => clone_dir,
        };
        if !root.is_dir() {
            return Err(FetchError::SourceNotFound {
                source_path: format!("{} in {}", root.display(), self.repository),
            });
        }

        let destination = self.destination.clone();
        tokio::task::spawn_blocking(move || copy_dir(&root, &destination))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(source: &str) -> GitFetcher {
        GitFetcher::new(source.into(), Path::new("/tmp/x")).unwrap()
    }

    #[test]
    fn test_parses_forced_scp_source() {
        let f = fetcher("git::git@gitlab.com:org/event-receiver.git//event-receiver?ref=main");
        assert_eq!(f.repository(), "git@gitlab.com:org/event-receiver.git");
        assert_eq!(f.subdir(), Some("event-receiver"));
        assert_eq!(f.reference(), Some("main"));
    }

    #[test]
    fn test_single_slash_subpath() {
        let f = fetcher("https://example.com/org/packs.git/charts/web?ref=v2");
        assert_eq!(f.repository(), "https://example.com/org/packs.git");
        assert_eq!(f.subdir(), Some("charts/web"));
    }

    #[test]
    fn test_plain_remote() {
        let f = fetcher("ssh://git@example.com/packs");
        assert_eq!(f.repository(), "ssh://git@example.com/packs");
        assert_eq!(f.subdir(), None);
        assert_eq!(f.reference(), None);
    }

    #[test]
    fn test_key_file_is_private() {
        let f = fetcher("git@example.com:org/packs.git?sshkey=c2VjcmV0");
        let file = f.write_key("c2VjcmV0").unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "secret");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_bad_key_rejected() {
        let f = fetcher("git@example.com:org/packs.git");
        assert!(matches!(f.write_key("***"), Err(FetchError::InvalidSource { .. })));
    }

    #[tokio::test]
    async fn test_missing_git_binary() {
        let f = fetcher("git@example.com:org/packs.git").with_git_binary("definitely-not-git-binary");
        let err = f.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Git { .. }));
    }

    /// Repository with two commits: `old` holds replicas 1, `HEAD` replicas 2
    fn local_repo(dir: &Path) -> (String, String) {
        let git = |args: &[&str]| {
            let output = std::process::Command::new("git")
                .args(["-c", "user.name=packrender", "-c", "user.email=packrender@example.com"])
                .args(["-c", "commit.gpgsign=false"])
                .args(args)
                .current_dir(dir)
                .output()
                .unwrap();
            assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };

        git(&["init", "--quiet", "--initial-branch=main"]);
        std::fs::create_dir_all(dir.join("web")).unwrap();
        std::fs::write(dir.join("web/values.yaml"), "replicas: 1\n").unwrap();
        git(&["add", "."]);
        git(&["commit", "--quiet", "-m", "first"]);
        let old = git(&["rev-parse", "HEAD"]);

        std::fs::write(dir.join("web/values.yaml"), "replicas: 2\n").unwrap();
        git(&["commit", "--quiet", "-am", "second"]);
        let head = git(&["rev-parse", "HEAD"]);
        (old, head)
    }

    #[test]
    fn test_commit_id_detection() {
        assert!(is_commit_id("cb0464b"));
        assert!(is_commit_id("cb0464b5e1f6a7d8c9b0a1b2c3d4e5f6a7b8c9d0"));
        assert!(!is_commit_id("main"));
        assert!(!is_commit_id("v1.2.3"));
        assert!(!is_commit_id("abc"));
    }

    #[tokio::test]
    async fn test_fetches_commit_ref() {
        let repo = tempfile::tempdir().unwrap();
        let (_, head) = local_repo(repo.path());
        let dest = tempfile::tempdir().unwrap();

        let source = format!("git::file://{}//web?ref={}", repo.path().display(), head);
        GitFetcher::new(source.as_str().into(), dest.path())
            .unwrap()
            .fetch()
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.path().join("values.yaml")).unwrap(),
            "replicas: 2\n"
        );
    }

    #[tokio::test]
    async fn test_fetches_branch_ref() {
        let repo = tempfile::tempdir().unwrap();
        local_repo(repo.path());
        let dest = tempfile::tempdir().unwrap();

        let source = format!("git::file://{}//web?ref=main", repo.path().display());
        GitFetcher::new(source.as_str().into(), dest.path())
            .unwrap()
            .fetch()
            .await
            .unwrap();

        assert!(dest.path().join("values.yaml").is_file());
        assert!(!dest.path().join(".git").exists());
    }

    #[tokio::test]
    async fn test_unknown_ref_keeps_clone_error() {
        let repo = tempfile::tempdir().unwrap();
        local_repo(repo.path());
        let dest = tempfile::tempdir().unwrap();

        let source = format!("git::file://{}?ref=no-such-branch", repo.path().display());
        let err = GitFetcher::new(source.as_str().into(), dest.path())
            .unwrap()
            .fetch()
            .await
            .unwrap_err();

        match err {
            FetchError::Git { message } => assert!(message.contains("no-such-branch"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
