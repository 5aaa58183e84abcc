//! Durable local cache for the last known roster snapshot.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::SyncError;
use crate::models::RosterSnapshot;

/// One cache entry holding the same snapshot shape as the remote document.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// `None` when nothing has been cached yet.
    async fn read(&self) -> Result<Option<RosterSnapshot>, SyncError>;

    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError>;
}

/// JSON file cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn read(&self) -> Result<Option<RosterSnapshot>, SyncError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::LocalUnavailable(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SyncError::MalformedCache(e.to_string()))
    }

    async fn write(&self, snapshot: &RosterSnapshot) -> Result<(), SyncError> {
        let body = serde_json::to_vec(snapshot)
            .map_err(|e| SyncError::LocalUnavailable(e.to_string()))?;
        let path = self.path.clone();

        // Each write gets its own temp file in the same directory, then renames
        // over the entry, so concurrent writers never share a half-written file.
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)?;

            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&body)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| SyncError::LocalUnavailable(format!("Cache writer failed: {}", e)))?
        .map_err(|e| SyncError::LocalUnavailable(format!("Failed to write cache: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RosterState;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("cache.json"));
        assert_eq!(cache.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("nested/cache.json"));
        let snapshot = RosterState::seeded().to_snapshot(Utc::now());

        cache.write(&snapshot).await.unwrap();
        assert_eq!(cache.read().await.unwrap(), Some(snapshot));

        let entries = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes_leave_one_whole_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("cache.json"));

        let writes = (0..16u32).map(|kills| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let mut state = RosterState::seeded();
                state.general_stats.kills = kills;
                cache.write(&state.to_snapshot(Utc::now())).await
            })
        });
        for write in writes.collect::<Vec<_>>() {
            write.await.unwrap().unwrap();
        }

        let stored = cache.read().await.unwrap().unwrap();
        assert!(stored.general_stats.unwrap().kills < 16);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = FileCache::new(path);
        assert!(matches!(
            cache.read().await,
            Err(SyncError::MalformedCache(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_in_the_way_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());
        assert!(matches!(
            cache.read().await,
            Err(SyncError::LocalUnavailable(_))
        ));
    }
}
