//! First-time installation.
//!
//! Installation is a linear sequence where every failure is terminal:
//!
//! 1. **Precondition** - the store root must not exist ([`ScriptGrabError::AlreadyInstalled`]);
//!    an existing install is never merged into and its link is left alone
//! 2. **Populate** - clone the payload repository into a staging directory next
//!    to the store root
//! 3. **Permission** - mark the launcher executable, then rename the staged tree
//!    into place
//! 4. **Publish** - point the global command link at the launcher
//!
//! Staging keeps the store from ever being observable half-installed: if the
//! clone or the permission step fails, the staging directory is dropped and
//! nothing else has been touched.

use crate::config::GlobalConfig;
use crate::core::ScriptGrabError;
use crate::git::{PayloadRepo, ensure_git_available};
use crate::publish::GlobalCommandLink;
use crate::store::PayloadStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of the staging directory created next to the store root.
const STAGING_PREFIX: &str = ".scriptgrab-staging-";

/// What a successful install produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Store root
    pub store_root: PathBuf,
    /// Absolute launcher path
    pub launcher: PathBuf,
    /// Global command link
    pub link: PathBuf,
    /// Commit checked out in the store
    pub commit: String,
}

/// Performs the one-shot install.
#[derive(Debug, Clone)]
pub struct Installer {
    repo_url: String,
    store: PayloadStore,
    link: GlobalCommandLink,
    git_timeout: Duration,
}

impl Installer {
    /// Create an installer from its parts.
    pub fn new(
        repo_url: impl Into<String>,
        store: PayloadStore,
        link: GlobalCommandLink,
        git_timeout: Duration,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            store,
            link,
            git_timeout,
        }
    }

    /// Installer described by the configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(
            &config.repo_url,
            PayloadStore::from_config(config),
            GlobalCommandLink::from_config(config),
            config.git.timeout(),
        )
    }

    /// The store being installed.
    #[must_use]
    pub fn store(&self) -> &PayloadStore {
        &self.store
    }

    /// Run the install.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::StoreLocked`] if another invocation is running
    /// - [`ScriptGrabError::AlreadyInstalled`] if the store root exists
    /// - [`ScriptGrabError::GitNotFound`] / [`ScriptGrabError::GitCloneFailed`] while populating
    /// - [`ScriptGrabError::LauncherNotFound`] / [`ScriptGrabError::PermissionError`] for the launcher
    /// - [`ScriptGrabError::PublishError`] / [`ScriptGrabError::StaleLink`] while publishing
    pub async fn install(&self) -> Result<InstallReport> {
        let _lock = self.store.lock().await?;

        let root = self.store.root();
        if self.store.exists() {
            return Err(ScriptGrabError::AlreadyInstalled {
                path: root.display().to_string(),
            }
            .into());
        }
        ensure_git_available()?;

        tracing::info!("Installing {} into {}", self.repo_url, root.display());
        let commit = self.populate(root).await?;

        let launcher = self.store.launcher_path();
        self.link.publish(&launcher).await?;
        self.link.verify().await?;

        Ok(InstallReport {
            store_root: root.to_path_buf(),
            launcher,
            link: self.link.link_path().to_path_buf(),
            commit,
        })
    }

    // Clone into staging, make the launcher executable, then move into place
    async fn populate(&self, root: &Path) -> Result<String> {
        let parent = root.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;
        let staged_root = staging.path().join("payload");

        let repo = PayloadRepo::clone(&self.repo_url, &staged_root, Some(self.git_timeout)).await?;
        repo.ignore_file_modes().await?;
        let commit = repo.head().await?;

        PayloadStore::new(&staged_root, self.store.launcher_relative())
            .ensure_launcher_executable()
            .await
            .map_err(|e| match e.downcast::<ScriptGrabError>() {
                Ok(ScriptGrabError::LauncherNotFound {
                    launcher,
                    ..
                }) => ScriptGrabError::LauncherNotFound {
                    launcher,
                    root: self.repo_url.clone(),
                }
                .into(),
                Ok(other) => other.into(),
                Err(e) => e,
            })?;

        tokio::fs::rename(&staged_root, root).await.with_context(|| {
            format!("Failed to move staged payload into {}", root.display())
        })?;
        tracing::debug!("Store populated at {} ({})", root.display(), commit);
        Ok(commit)
    }
}
