// Local storage adapter - Working and archive directories under the staged path

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::ports::*;

const TRANSCODED_DIR: &str = "transcoded";
const EDITED_DIR: &str = "edited";
const TRANSCODE_WORK_DIR: &str = "transcode_work";
const EXPORT_WORK_DIR: &str = "export_work";

/// Storage path provider rooted at a single staged directory
#[derive(Debug, Clone)]
pub struct LocalStorageAdapter {
    staged_path: PathBuf,
}

impl LocalStorageAdapter {
    /// Create new local storage adapter; nothing is created until first use
    pub fn new(staged_path: impl Into<PathBuf>) -> Self {
        Self {
            staged_path: staged_path.into(),
        }
    }

    pub fn staged_path(&self) -> &Path {
        &self.staged_path
    }

    async fn ensure(&self, name: &str) -> Result<PathBuf, DomainError> {
        let dir = self.staged_path.join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::fs("create directory", &dir, e))?;
        Ok(dir)
    }
}

#[async_trait]
impl StoragePort for LocalStorageAdapter {
    async fn scratch_directory(&self) -> Result<PathBuf, DomainError> {
        self.ensure(TRANSCODE_WORK_DIR).await
    }

    async fn archive_directory(&self) -> Result<PathBuf, DomainError> {
        self.ensure(TRANSCODED_DIR).await
    }

    async fn edited_directory(&self) -> Result<PathBuf, DomainError> {
        self.ensure(EDITED_DIR).await
    }

    async fn export_work_directory(&self) -> Result<PathBuf, DomainError> {
        self.ensure(EXPORT_WORK_DIR).await
    }
}
