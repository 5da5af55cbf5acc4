//! Rendered-manifest caches
//!
//! Cache-aside storage keyed by the caller-supplied source. A lookup either
//! hits or misses; backends that fail internally report a miss.

use packrender_kube::RenderResult;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::CacheError;
use crate::source::SourceIdentifier;

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(RenderResult),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_hit(self) -> Option<RenderResult> {
        match self {
            Self::Hit(result) => Some(result),
            Self::Miss => None,
        }
    }
}

/// Storage for decoded render results
pub trait ManifestCache: Send + Sync {
    fn lookup(&self, key: &SourceIdentifier) -> CacheLookup;

    /// Best effort; callers log and ignore failures
    fn store(&self, key: &SourceIdentifier, value: &RenderResult) -> Result<(), CacheError>;
}

/// In-memory cache, shared between clones
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<SourceIdentifier, RenderResult>>>,
    counts: Arc<RwLock<CacheCounts>>,
}

/// Operations performed on a [`MemoryCache`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheCounts {
    pub lookups: usize,
    pub hits: usize,
    pub stores: usize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated entries
    pub fn with_entries(entries: impl IntoIterator<Item = (SourceIdentifier, RenderResult)>) -> Self {
        let cache = Self::new();
        cache
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(entries);
        cache
    }

    pub fn counts(&self) -> CacheCounts {
        *self.counts.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &SourceIdentifier) -> Option<RenderResult> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn count(&self, f: impl FnOnce(&mut CacheCounts)) {
        f(&mut self.counts.write().unwrap_or_else(PoisonError::into_inner));
    }
}

impl ManifestCache for MemoryCache {
    fn lookup(&self, key: &SourceIdentifier) -> CacheLookup {
        let found = self.get(key);
        self.count(|c| {
            c.lookups += 1;
            if found.is_some() {
                c.hits += 1;
            }
        });

        match found {
            Some(result) => CacheLookup::Hit(result),
            None => CacheLookup::Miss,
        }
    }

    fn store(&self, key: &SourceIdentifier, value: &RenderResult) -> Result<(), CacheError> {
        self.count(|c| c.stores += 1);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value.clone());
        Ok(())
    }
}
