//! Durable backing for usage counters.

use crate::{SNAPSHOT_VERSION, UsageSnapshot};
use fabula_error::{FabulaResult, StorageError, StorageErrorKind};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Pluggable storage for usage snapshots.
///
/// The quota store itself is purely in-memory. A repository lets a process
/// pick counters up again after a restart instead of treating every restart
/// as a new month.
#[async_trait::async_trait]
pub trait UsageRepository: Send + Sync {
    /// Read the last saved snapshot, `None` if nothing was saved yet.
    async fn load(&self) -> FabulaResult<Option<UsageSnapshot>>;

    /// Replace the saved snapshot.
    async fn save(&self, snapshot: &UsageSnapshot) -> FabulaResult<()>;
}

/// Repository that keeps the snapshot in memory. Useful in tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    slot: Mutex<Option<UsageSnapshot>>,
}

impl MemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UsageRepository for MemoryRepository {
    async fn load(&self) -> FabulaResult<Option<UsageSnapshot>> {
        Ok(self.slot.lock().clone())
    }

    async fn save(&self, snapshot: &UsageSnapshot) -> FabulaResult<()> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }
}

/// Repository backed by a pretty-printed JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Repository at `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the counter file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a save writes before renaming over the target.
    ///
    /// Appends to the full file name so it never equals the target.
    pub(crate) fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait::async_trait]
impl UsageRepository for JsonFileRepository {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> FabulaResult<Option<UsageSnapshot>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Counter file does not exist yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
                .into());
            }
        };

        let snapshot: UsageSnapshot = serde_json::from_slice(&data).map_err(|e| {
            StorageError::new(StorageErrorKind::Encoding(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(
                StorageError::new(StorageErrorKind::UnsupportedVersion(snapshot.version)).into(),
            );
        }

        tracing::debug!(counters = snapshot.counters.len(), "Loaded counter file");
        Ok(Some(snapshot))
    }

    #[tracing::instrument(
        skip(self, snapshot),
        fields(path = %self.path.display(), counters = snapshot.counters.len())
    )]
    async fn save(&self, snapshot: &UsageSnapshot) -> FabulaResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StorageError::new(StorageErrorKind::Encoding(e.to_string())))?;

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )))
        })?;

        tracing::debug!(bytes = json.len(), "Wrote counter file");
        Ok(())
    }
}
