//! Time-boxed memoization of playlist fetches.
//!
//! [`CachedSource`] wraps any [`PlaylistSource`] and serves repeated fetches
//! of the same id from a [`CacheStore`] until the entry is older than the
//! configured TTL. Failed fetches are never stored.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::ports::playlist::{FetchError, PlaylistId, PlaylistSource, ProgressListener};
use crate::reconcile::PlaylistCollection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix timestamp (milliseconds) of the fetch
    pub fetched_at: i64,
    pub playlist: PlaylistCollection,
}

/// Storage backend for cached playlist snapshots.
///
/// Stores are best effort: read failures are misses, write failures are
/// logged and dropped.
#[cfg_attr(test, mockall::automock)]
pub trait CacheStore: Send + Sync {
    fn get(&self, id: &PlaylistId) -> Option<CacheEntry>;
    fn put(&self, id: &PlaylistId, entry: &CacheEntry);
}

#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<PlaylistId, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, id: &PlaylistId) -> Option<CacheEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    fn put(&self, id: &PlaylistId, entry: &CacheEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id.clone(), entry.clone());
    }
}

/// One JSON file per playlist id inside `directory`.
pub struct DiskCacheStore {
    directory: PathBuf,
}

impl DiskCacheStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn entry_path(&self, id: &PlaylistId) -> PathBuf {
        self.directory.join(format!("{}.json", id.as_str()))
    }

    fn write_entry(&self, path: &Path, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.directory).wrap_err_with(|| {
            format!(
                "Failed to create cache directory: {}",
                self.directory.display()
            )
        })?;
        let json = serde_json::to_string(entry).wrap_err("Failed to serialize cache entry")?;
        fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write cache file: {}", path.display()))?;
        Ok(())
    }
}

impl CacheStore for DiskCacheStore {
    fn get(&self, id: &PlaylistId) -> Option<CacheEntry> {
        let path = self.entry_path(id);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::warn!("Ignoring unreadable cache file {}: {}", path.display(), error);
                None
            }
        }
    }

    fn put(&self, id: &PlaylistId, entry: &CacheEntry) {
        let path = self.entry_path(id);
        if let Err(error) = self.write_entry(&path, entry) {
            log::warn!("Skipping cache write: {:#}", error);
        }
    }
}

pub struct CachedSource<S, C> {
    source: S,
    store: C,
    ttl: Duration,
}

impl<S: PlaylistSource, C: CacheStore> CachedSource<S, C> {
    pub fn new(source: S, store: C, ttl: Duration) -> Self {
        Self { source, store, ttl }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        match u64::try_from(now - entry.fetched_at) {
            Ok(age) => Duration::from_millis(age) < self.ttl,
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl<S: PlaylistSource, C: CacheStore> PlaylistSource for CachedSource<S, C> {
    async fn fetch_playlist<'p>(
        &self,
        id: &PlaylistId,
        progress: &'p (dyn ProgressListener + 'p),
    ) -> Result<PlaylistCollection, FetchError> {
        let now = chrono::Utc::now().timestamp_millis();

        if let Some(entry) = self.store.get(id) {
            if self.is_fresh(&entry, now) {
                log::debug!(
                    "Cache hit for playlist {} ({}ms old)",
                    id,
                    now - entry.fetched_at
                );
                let total = entry.playlist.len();
                progress.on_progress(total, total);
                return Ok(entry.playlist);
            }
            log::debug!("Cache entry for playlist {} expired", id);
        } else {
            log::debug!("Cache miss for playlist {}", id);
        }

        let playlist = self.source.fetch_playlist(id, progress).await?;
        self.store.put(
            id,
            &CacheEntry {
                fetched_at: now,
                playlist: playlist.clone(),
            },
        );
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::playlist::{MockPlaylistSource, NoProgress};
    use crate::reconcile::TrackRecord;

    fn sample_playlist(name: &str) -> PlaylistCollection {
        PlaylistCollection::new(
            name,
            vec![TrackRecord {
                id: "1".into(),
                title: "Song".into(),
                artist: "Artist".into(),
                album: "Album".into(),
                duration: "03:00".into(),
            }],
        )
    }

    fn source_fetching(times: usize) -> MockPlaylistSource {
        let mut source = MockPlaylistSource::new();
        source
            .expect_fetch_playlist()
            .times(times)
            .returning(|_, _| Ok(sample_playlist("fresh")));
        source
    }

    fn id() -> PlaylistId {
        PlaylistId::parse("42").unwrap()
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_is_served_from_cache() {
        let cached = CachedSource::new(
            source_fetching(1),
            MemoryCacheStore::new(),
            Duration::from_secs(3600),
        );

        let first = cached.fetch_playlist(&id(), &NoProgress).await.unwrap();
        let second = cached.fetch_playlist(&id(), &NoProgress).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sub_second_ttl_still_caches() {
        let cached = CachedSource::new(
            source_fetching(1),
            MemoryCacheStore::new(),
            Duration::from_millis(500),
        );

        cached.fetch_playlist(&id(), &NoProgress).await.unwrap();
        cached.fetch_playlist(&id(), &NoProgress).await.unwrap();
    }

    #[test]
    fn test_freshness_is_compared_in_milliseconds() {
        let cached = CachedSource::new(
            MockPlaylistSource::new(),
            MemoryCacheStore::new(),
            Duration::from_millis(500),
        );
        let entry = CacheEntry {
            fetched_at: 1_700_000_000_000,
            playlist: sample_playlist("cached"),
        };

        assert!(cached.is_fresh(&entry, entry.fetched_at + 499));
        assert!(!cached.is_fresh(&entry, entry.fetched_at + 500));
        assert!(!cached.is_fresh(&entry, entry.fetched_at - 1));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cached =
            CachedSource::new(source_fetching(2), MemoryCacheStore::new(), Duration::ZERO);

        cached.fetch_playlist(&id(), &NoProgress).await.unwrap();
        cached.fetch_playlist(&id(), &NoProgress).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched_and_replaced() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| {
            Some(CacheEntry {
                fetched_at: now_ms() - 7_200_000,
                playlist: sample_playlist("stale"),
            })
        });
        store
            .expect_put()
            .withf(|id, entry| id.as_str() == "42" && entry.playlist.name == "fresh")
            .times(1)
            .return_const(());
        let cached = CachedSource::new(source_fetching(1), store, Duration::from_secs(3600));

        let playlist = cached.fetch_playlist(&id(), &NoProgress).await.unwrap();

        assert_eq!(playlist.name, "fresh");
    }

    #[tokio::test]
    async fn test_fresh_entry_reports_completion() {
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| {
            Some(CacheEntry {
                fetched_at: now_ms(),
                playlist: sample_playlist("cached"),
            })
        });
        store.expect_put().never();
        let cached = CachedSource::new(source_fetching(0), store, Duration::from_secs(3600));
        let calls = Mutex::new(Vec::new());
        let progress =
            |completed: usize, total: usize| calls.lock().unwrap().push((completed, total));

        let playlist = cached.fetch_playlist(&id(), &progress).await.unwrap();

        assert_eq!(playlist.name, "cached");
        assert_eq!(*calls.lock().unwrap(), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_fetch_playlist()
            .times(1)
            .returning(|id, _| Err(FetchError::MissingPlaylist(id.clone())));
        let mut store = MockCacheStore::new();
        store.expect_get().returning(|_| None);
        store.expect_put().never();
        let cached = CachedSource::new(source, store, Duration::from_secs(3600));

        let result = cached.fetch_playlist(&id(), &NoProgress).await;

        assert!(matches!(result, Err(FetchError::MissingPlaylist(_))));
    }

    #[test]
    fn test_disk_store_round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::new(dir.path().join("nested"));
        let entry = CacheEntry {
            fetched_at: 1_700_000_000_000,
            playlist: sample_playlist("disk"),
        };

        assert!(store.get(&id()).is_none());
        store.put(&id(), &entry);

        assert_eq!(store.get(&id()), Some(entry));
    }

    #[test]
    fn test_disk_store_ignores_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("42.json"), "not json").unwrap();
        let store = DiskCacheStore::new(dir.path().to_path_buf());

        assert!(store.get(&id()).is_none());
    }

    #[test]
    fn test_disk_store_write_failure_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();
        let store = DiskCacheStore::new(blocker.join("cache"));
        let entry = CacheEntry {
            fetched_at: 0,
            playlist: sample_playlist("disk"),
        };

        let error = store
            .write_entry(&store.entry_path(&id()), &entry)
            .unwrap_err();
        assert!(format!("{:#}", error).contains("Failed to create cache directory"));

        store.put(&id(), &entry);
        assert!(store.get(&id()).is_none());
    }
}
