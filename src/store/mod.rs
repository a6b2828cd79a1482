//! The local payload store.
//!
//! A single directory tree (a git working tree) holding the payload and the
//! launcher entry point. The store is "installed" once the launcher exists
//! under the root. It is created by the installer, advanced in place by the
//! updater, and never removed by scriptgrab.

pub mod lock;

pub use lock::StoreLock;

use crate::config::GlobalConfig;
use crate::core::ScriptGrabError;
use anyhow::Result;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Execute bits for owner, group and other (`chmod +x`).
const EXECUTE_BITS: u32 = 0o111;

/// On-disk payload store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadStore {
    root: PathBuf,
    launcher: PathBuf,
}

impl PayloadStore {
    /// Describe a store at `root` whose launcher lives at `launcher` (relative).
    pub fn new(root: impl Into<PathBuf>, launcher: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            launcher: launcher.into(),
        }
    }

    /// Store described by the configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.store_root_path(), &config.launcher)
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Launcher path relative to the root.
    #[must_use]
    pub fn launcher_relative(&self) -> &Path {
        &self.launcher
    }

    /// Absolute launcher path.
    #[must_use]
    pub fn launcher_path(&self) -> PathBuf {
        self.root.join(&self.launcher)
    }

    /// Whether anything exists at the store root.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    /// Whether the store exists and contains its launcher.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.launcher_path().is_file()
    }

    /// Whether `relative` exists and has any execute bit set.
    #[must_use]
    pub fn is_executable(&self, relative: &Path) -> bool {
        std::fs::metadata(self.root.join(relative))
            .map(|meta| meta.is_file() && meta.permissions().mode() & EXECUTE_BITS != 0)
            .unwrap_or(false)
    }

    /// Add the execute bits to `relative` under the root. Idempotent.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::LauncherNotFound`] if the file does not exist
    /// - [`ScriptGrabError::PermissionError`] if the mode cannot be changed
    pub async fn ensure_executable(&self, relative: &Path) -> Result<()> {
        let path = self.root.join(relative);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                return Err(self.launcher_not_found(relative));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(self.launcher_not_found(relative));
            }
            Err(e) => return Err(ScriptGrabError::IoError(e).into()),
        };

        let mut permissions = metadata.permissions();
        let mode = permissions.mode();
        if mode & EXECUTE_BITS == EXECUTE_BITS {
            return Ok(());
        }

        permissions.set_mode(mode | EXECUTE_BITS);
        tokio::fs::set_permissions(&path, permissions).await.map_err(|e| {
            ScriptGrabError::PermissionError {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!("Marked {} executable", path.display());
        Ok(())
    }

    /// [`ensure_executable`](Self::ensure_executable) on the launcher.
    pub async fn ensure_launcher_executable(&self) -> Result<()> {
        self.ensure_executable(&self.launcher).await
    }

    /// Take the store's advisory lock.
    pub async fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.root).await
    }

    fn launcher_not_found(&self, relative: &Path) -> anyhow::Error {
        ScriptGrabError::LauncherNotFound {
            launcher: relative.display().to_string(),
            root: self.root.display().to_string(),
        }
        .into()
    }
}
