//! Source locations and their parameterization
//!
//! A source is a plain string: a local directory, an HTTP(S) archive URL or a
//! git remote. Version-control options are appended to it in the query form
//! understood by the fetchers:
//!
//! ```text
//! git::git@example.com:org/packs.git/web?ref=main&sshkey=<base64 key>
//! https://charts.example/web-1.0.0.tgz?checksum=sha256:<hex>
//! ./packs/web
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix forcing the git fetcher
pub const GIT_FORCE_PREFIX: &str = "git::";

/// A retrievable pack location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceIdentifier(String);

impl SourceIdentifier {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> SourceKind {
        SourceKind::detect(self)
    }

    /// Split off the query parameters the fetchers understand
    pub fn split_query(&self) -> SourceParts {
        let (location, query) = match self.0.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (self.0.as_str(), None),
        };

        let mut parts = SourceParts {
            location: location.to_string(),
            subdir: None,
            reference: None,
            sshkey: None,
            checksum: None,
        };

        // Values are taken raw: base64 keys keep their `=` padding
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = (!value.is_empty()).then(|| value.to_string());
            match key {
                "ref" => parts.reference = value,
                "sshkey" => parts.sshkey = value,
                "checksum" => parts.checksum = value,
                _ => {}
            }
        }

        parts
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceIdentifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A source taken apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParts {
    /// Everything before the query string
    pub location: String,
    pub subdir: Option<String>,
    pub reference: Option<String>,
    pub sshkey: Option<String>,
    pub checksum: Option<String>,
}

impl SourceParts {
    /// Separate a `//subdir` suffix from the location.
    ///
    /// The `//` of a URL scheme (`https://`) does not count.
    pub fn with_subdir_split(mut self) -> Self {
        let search_from = self.location.find("://").map(|i| i + 3).unwrap_or(0);
        if let Some(pos) = self.location[search_from..].find("//") {
            let split = search_from + pos;
            let subdir = self.location[split + 2..].trim_matches('/').to_string();
            self.location.truncate(split);
            if !subdir.is_empty() {
                self.subdir = Some(subdir);
            }
        }
        self
    }
}

/// Version-control options applied to a source before fetching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitOptions {
    /// Directory inside the source holding the pack
    pub subpath: Option<String>,

    /// Branch, tag or commit to check out
    pub branch: Option<String>,

    /// Base64 encoded private key for SSH remotes
    pub credential: Option<String>,
}

impl GitOptions {
    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = Some(subpath.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

fn present(option: &Option<String>) -> Option<&str> {
    option.as_deref().filter(|s| !s.is_empty())
}

/// Apply `options` to `source`, returning the identifier handed to a fetcher.
///
/// The subpath is joined with `/`; branch and credential become a single
/// query suffix. Empty strings count as unset. `source` is left untouched, so
/// calling this any number of times on the same input yields the same output.
pub fn normalize(source: &SourceIdentifier, options: &GitOptions) -> SourceIdentifier {
    let mut out = source.as_str().to_string();

    if let Some(subpath) = present(&options.subpath) {
        out = format!("{}/{}", out, subpath);
    }

    match (present(&options.branch), present(&options.credential)) {
        (Some(branch), Some(key)) => out = format!("{}?ref={}&sshkey={}", out, branch, key),
        (Some(branch), None) => out = format!("{}?ref={}", out, branch),
        (None, Some(key)) => out = format!("{}?sshkey={}", out, key),
        (None, None) => {}
    }

    SourceIdentifier(out)
}

/// Which fetcher handles a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Git,
    Http,
    Local,
}

impl SourceKind {
    pub fn detect(source: &SourceIdentifier) -> Self {
        let parts = source.split_query().with_subdir_split();
        let location = parts.location.as_str();

        if location.starts_with(GIT_FORCE_PREFIX)
            || location.starts_with("git@")
            || location.starts_with("ssh://")
            || location.starts_with("git://")
            || location.ends_with(".git")
            || location.contains(".git/")
        {
            SourceKind::Git
        } else if location.starts_with("http://") || location.starts_with("https://") {
            SourceKind::Http
        } else {
            SourceKind::Local
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Git => "git",
            Self::Http => "http",
            Self::Local => "local",
        };
        write!(f, "{}", s)
    }
}
