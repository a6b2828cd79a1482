//! Advisory lock serializing lifecycle operations on one store.
//!
//! The lock file sits next to the store root (`<parent>/.<store-name>.lock`) so
//! it can be taken before the store exists. A second invocation fails fast with
//! [`ScriptGrabError::StoreLocked`] rather than waiting. The lock is released
//! when the [`StoreLock`] is dropped.

use crate::core::ScriptGrabError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Held exclusive lock on a store.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Lock file path for `store_root`.
    #[must_use]
    pub fn lock_path(store_root: &Path) -> PathBuf {
        let name = store_root.file_name().map_or_else(
            || "store".to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let parent = store_root.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{name}.lock"))
    }

    /// Take the lock without blocking.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::StoreLocked`] if another process holds it, or an I/O
    /// error if the lock file cannot be created.
    pub async fn acquire(store_root: &Path) -> Result<Self> {
        let path = Self::lock_path(store_root);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let lock_path = path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

            if !file.try_lock_exclusive()? {
                return Err(ScriptGrabError::StoreLocked {
                    path: lock_path.display().to_string(),
                }
                .into());
            }
            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::debug!("Acquired store lock {}", path.display());
        Ok(Self {
            _file: file,
            path,
        })
    }

    /// Path of the held lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
