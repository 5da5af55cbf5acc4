//! SQLite-backed manifest cache
//!
//! One row per source. The payload is the JSON encoded render result,
//! compressed with zstd. The database runs in WAL mode and is recreated if it
//! cannot be opened.

use chrono::{DateTime, Utc};
use packrender_kube::RenderResult;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cache::{CacheLookup, ManifestCache};
use crate::error::CacheError;
use crate::source::SourceIdentifier;

const COMPRESSION_LEVEL: i32 = 3;

type Result<T> = std::result::Result<T, CacheError>;

/// Persistent cache of rendered manifests
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create cache at default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(&path)
    }

    /// Open or create cache at specific path
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opened = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .and_then(|conn| Self::init(&conn).map(|_| conn));

        let conn = match opened {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cache corrupted, recreating: {}", e);
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
                let conn = Connection::open(path)?;
                Self::init(&conn)?;
                conn
            }
        };

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open in-memory cache (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// `<cache dir>/packrender/manifests.db`
    pub fn default_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| CacheError::Unavailable {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("packrender").join("manifests.db"))
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS manifests (
                source TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                resource_count INTEGER NOT NULL,
                stored_at INTEGER NOT NULL
            );
            "#,
        )
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch an entry, distinguishing absence from failure
    pub fn get(&self, key: &SourceIdentifier) -> Result<Option<RenderResult>> {
        let payload: Option<Vec<u8>> = self
            .conn()
            .query_row(
                "SELECT payload FROM manifests WHERE source = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        payload.map(|p| decode_payload(&p)).transpose()
    }

    pub fn put(&self, key: &SourceIdentifier, value: &RenderResult) -> Result<()> {
        let payload = encode_payload(value)?;
        self.conn().execute(
            r#"
            INSERT INTO manifests (source, payload, resource_count, stored_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(source) DO UPDATE SET
                payload = excluded.payload,
                resource_count = excluded.resource_count,
                stored_at = excluded.stored_at
            "#,
            params![
                key.as_str(),
                payload,
                value.len() as i64,
                Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    /// Remove one entry, returning whether it existed
    pub fn remove(&self, key: &SourceIdentifier) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM manifests WHERE source = ?1", [key.as_str()])?;
        Ok(removed > 0)
    }

    /// Remove every entry, returning how many were dropped
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM manifests", [])?)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn();
        let (entry_count, resource_count, oldest, newest): (i64, Option<i64>, Option<i64>, Option<i64>) =
            conn.query_row(
                "SELECT COUNT(*), SUM(resource_count), MIN(stored_at), MAX(stored_at) FROM manifests",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;

        let timestamp = |ts: Option<i64>| ts.and_then(|ts| DateTime::from_timestamp(ts, 0));
        Ok(CacheStats {
            entry_count: entry_count as usize,
            resource_count: resource_count.unwrap_or_default() as usize,
            oldest_entry: timestamp(oldest),
            newest_entry: timestamp(newest),
        })
    }
}

impl ManifestCache for SqliteCache {
    fn lookup(&self, key: &SourceIdentifier) -> CacheLookup {
        match self.get(key) {
            Ok(Some(result)) => CacheLookup::Hit(result),
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(source = %key, "cache lookup failed, treating as miss: {}", e);
                CacheLookup::Miss
            }
        }
    }

    fn store(&self, key: &SourceIdentifier, value: &RenderResult) -> Result<()> {
        self.put(key, value)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: usize,
    pub resource_count: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

fn encode_payload(value: &RenderResult) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
        message: e.to_string(),
    })?;
    zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL).map_err(|e| CacheError::Compression {
        message: e.to_string(),
    })
}

fn decode_payload(payload: &[u8]) -> Result<RenderResult> {
    let json = zstd::decode_all(payload).map_err(|e| CacheError::Compression {
        message: e.to_string(),
    })?;
    serde_json::from_slice(&json).map_err(|e| CacheError::Serialization {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrender_kube::ResourceObject;

    fn sample() -> RenderResult {
        vec![
            ResourceObject::new("apps/v1", "Deployment", "web").with_namespace("prod"),
            ResourceObject::new("v1", "Service", "web").with_namespace("prod"),
        ]
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = SqliteCache::open_memory().unwrap();
        let key = SourceIdentifier::from("repo.example/org/repo");

        assert_eq!(cache.lookup(&key), CacheLookup::Miss);
        cache.store(&key, &sample()).unwrap();
        assert_eq!(cache.lookup(&key), CacheLookup::Hit(sample()));
    }

    #[test]
    fn test_store_replaces_entry() {
        let cache = SqliteCache::open_memory().unwrap();
        let key = SourceIdentifier::from("a");

        cache.store(&key, &sample()).unwrap();
        cache.store(&key, &sample()[..1].to_vec()).unwrap();

        assert_eq!(cache.get(&key).unwrap().map(|r| r.len()), Some(1));
        assert_eq!(cache.stats().unwrap().entry_count, 1);
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = SqliteCache::open_memory().unwrap();
        cache.store(&"a".into(), &sample()).unwrap();
        cache.store(&"b".into(), &sample()).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entry_count, 2);
        assert_eq!(stats.resource_count, 4);
        assert!(stats.oldest_entry.is_some());

        assert!(cache.remove(&"a".into()).unwrap());
        assert!(!cache.remove(&"a".into()).unwrap());
        assert_eq!(cache.clear().unwrap(), 1);
        assert_eq!(cache.stats().unwrap().entry_count, 0);
        assert!(cache.stats().unwrap().oldest_entry.is_none());
    }

    #[test]
    fn test_corrupt_payload_is_a_miss() {
        let cache = SqliteCache::open_memory().unwrap();
        cache
            .conn()
            .execute(
                "INSERT INTO manifests VALUES ('bad', x'00ff', 1, 0)",
                [],
            )
            .unwrap();

        assert!(cache.get(&"bad".into()).is_err());
        assert_eq!(cache.lookup(&"bad".into()), CacheLookup::Miss);
    }

    #[test]
    fn test_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("manifests.db");

        SqliteCache::open_at(&path)
            .unwrap()
            .store(&"a".into(), &sample())
            .unwrap();

        let reopened = SqliteCache::open_at(&path).unwrap();
        assert!(reopened.lookup(&"a".into()).is_hit());
    }

    #[test]
    fn test_garbage_file_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifests.db");
        std::fs::write(&path, "not a sqlite database\n".repeat(64)).unwrap();

        let cache = SqliteCache::open_at(&path).unwrap();
        assert_eq!(cache.stats().unwrap().entry_count, 0);
    }
}
