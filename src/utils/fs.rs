//! File choreography helpers: collision-safe archiving, cross-device moves,
//! timestamp capture/restore and best-effort cleanup.

use chrono::Utc;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::domain::errors::*;

/// High-resolution token for unique scratch file names
pub fn timestamp_token() -> String {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros())
        .to_string()
}

/// Access and modification times of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub accessed: FileTime,
    pub modified: FileTime,
}

impl FileTimes {
    /// Capture the times of an existing file
    pub async fn capture(path: &Path) -> Result<Self, DomainError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| DomainError::fs("stat", path, e))?;
        Ok(Self {
            accessed: FileTime::from_last_access_time(&metadata),
            modified: FileTime::from_last_modification_time(&metadata),
        })
    }

    /// Write these times onto `path`
    pub async fn restore(&self, path: &Path) -> Result<(), DomainError> {
        let target = path.to_path_buf();
        let (accessed, modified) = (self.accessed, self.modified);
        tokio::task::spawn_blocking(move || filetime::set_file_times(&target, accessed, modified))
            .await
            .map_err(|e| DomainError::Runtime(format!("timestamp restore task failed: {}", e)))?
            .map_err(|e| DomainError::fs("restore timestamps on", path, e))
    }
}

/// Move `from` to `to`, falling back to copy + delete when a rename is not
/// possible (e.g. scratch directory on another filesystem).
pub async fn move_file(from: &Path, to: &Path) -> Result<(), DomainError> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(from = %from.display(), to = %to.display(), "Rename failed ({}), copying instead", rename_err);
            tokio::fs::copy(from, to)
                .await
                .map_err(|e| DomainError::fs("copy", from, e))?;
            tokio::fs::remove_file(from)
                .await
                .map_err(|e| DomainError::fs("remove", from, e))
        }
    }
}

/// First free path for `file_name` in `dir`, adding a timestamp suffix on
/// collision and a counter if that is taken too. Never returns an existing path.
pub async fn free_target_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !path_exists(&candidate).await {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let millis = Utc::now().timestamp_millis();

    let mut attempt = 0u32;
    loop {
        let suffixed = match attempt {
            0 => format!("{}_{}{}", stem, millis, ext),
            n => format!("{}_{}_{}{}", stem, millis, n, ext),
        };
        let candidate = dir.join(suffixed);
        if !path_exists(&candidate).await {
            return candidate;
        }
        attempt += 1;
    }
}

/// Move `src` into `dest_dir`, renaming instead of overwriting. Returns the
/// archived location.
pub async fn move_with_conflict_handling(src: &Path, dest_dir: &Path) -> Result<PathBuf, DomainError> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| DomainError::fs("create directory", dest_dir, e))?;

    let file_name = src
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| DomainError::BadArgs(format!("Path has no file name: {}", src.display())))?;

    let target = free_target_path(dest_dir, &file_name).await;
    move_file(src, &target).await?;
    Ok(target)
}

/// Archive `original` into `archive_dir`, then move `replacement` onto the
/// original path. Returns where the original was archived.
///
/// If the final move fails the original is moved back. If that fails too, the
/// error names the archive location.
pub async fn replace_with_archive(
    original: &Path,
    replacement: &Path,
    archive_dir: &Path,
) -> Result<PathBuf, DomainError> {
    let archived = move_with_conflict_handling(original, archive_dir).await?;

    let Err(move_err) = move_file(replacement, original).await else {
        return Ok(archived);
    };

    match move_file(&archived, original).await {
        Ok(()) => {
            warn!(path = %original.display(), "Replacement failed, original restored");
            Err(move_err)
        }
        Err(restore_err) => {
            error!(
                path = %original.display(),
                archived = %archived.display(),
                "Replacement failed and original could not be restored"
            );
            Err(DomainError::FileSystem {
                context: format!("{}; original preserved at {}", move_err, archived.display()),
                source: std::io::Error::other(restore_err.to_string()),
            })
        }
    }
}

pub async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Delete a file, ignoring every error
pub async fn remove_file_quietly(path: &Path) {
    if path_exists(path).await {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), "Cleanup failed: {}", e);
        }
    }
}

/// Remove `dir` only if it is empty, ignoring every error
pub async fn remove_dir_if_empty(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    if let Ok(None) = entries.next_entry().await {
        let _ = tokio::fs::remove_dir(dir).await;
    }
}
