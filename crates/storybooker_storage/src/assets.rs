//! Per-job image storage.

use crate::fs::{safe_file_stem, write_atomic};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use storybooker_core::JobId;
use storybooker_error::{StorageError, StorageErrorKind, StorybookerResult};
use storybooker_interface::AssetStore;

/// Images stored as `<base>/<job_id>/<name>.png`.
#[derive(Debug, Clone)]
pub struct FileSystemAssetStore {
    base_path: PathBuf,
}

impl FileSystemAssetStore {
    /// Store rooted at `base_path`, created if missing.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> StorybookerResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        tracing::info!(path = %base_path.display(), "Opened asset store");
        Ok(Self { base_path })
    }

    /// Directory holding a job's assets.
    pub fn job_dir(&self, job: JobId) -> PathBuf {
        self.base_path.join(job.to_string())
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl AssetStore for FileSystemAssetStore {
    #[tracing::instrument(skip(self, bytes), fields(job = %job, size = bytes.len()))]
    async fn save_image(&self, job: JobId, name: &str, bytes: &[u8]) -> StorybookerResult<PathBuf> {
        let path = self
            .job_dir(job)
            .join(format!("{}.png", safe_file_stem(name)));
        write_atomic(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Stored asset");
        Ok(path)
    }
}
