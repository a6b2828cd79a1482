//! Publishing the launcher as a global command.
//!
//! The global command is a symbolic link at a fixed public path (by default
//! `/usr/local/bin/sg`) pointing at the launcher inside the store. Publishing
//! removes whatever file or link is at that path and creates a fresh symlink; a
//! directory in the way is refused. When the direct filesystem call is denied
//! and elevation is enabled, both steps are retried through `sudo`.
//!
//! Removal and creation are two steps, so a failure between them leaves no
//! command at all. That case is reported with `link_removed: true`.

use crate::config::GlobalConfig;
use crate::core::ScriptGrabError;
use crate::process::{Echo, ProcessCommand};
use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What is currently at the global command path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing at the path.
    Missing,
    /// A regular file or directory, not a symlink.
    NotSymlink,
    /// A symlink whose target does not exist.
    Stale {
        /// Raw link target
        target: PathBuf,
    },
    /// A symlink resolving to an existing file.
    Valid {
        /// Raw link target
        target: PathBuf,
    },
}

/// The fixed public path and how to publish it.
#[derive(Debug, Clone)]
pub struct GlobalCommandLink {
    link: PathBuf,
    elevate: bool,
}

impl GlobalCommandLink {
    /// Link at `link`; `elevate` enables the `sudo` retry.
    pub fn new(link: impl Into<PathBuf>, elevate: bool) -> Self {
        Self {
            link: link.into(),
            elevate,
        }
    }

    /// Link described by the configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.link_path_buf(), config.publish.elevate)
    }

    /// The fixed public path.
    #[must_use]
    pub fn link_path(&self) -> &Path {
        &self.link
    }

    /// Inspect the link without modifying anything.
    pub async fn resolve(&self) -> Result<LinkState> {
        let metadata = match tokio::fs::symlink_metadata(&self.link).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LinkState::Missing),
            Err(e) => return Err(ScriptGrabError::IoError(e).into()),
        };

        if !metadata.file_type().is_symlink() {
            return Ok(LinkState::NotSymlink);
        }

        let target = tokio::fs::read_link(&self.link).await?;
        let resolved = if target.is_absolute() {
            target.clone()
        } else {
            self.link.parent().unwrap_or_else(|| Path::new("/")).join(&target)
        };

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_file() => Ok(LinkState::Valid {
                target,
            }),
            _ => Ok(LinkState::Stale {
                target,
            }),
        }
    }

    /// Require a valid link and return its target.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::StaleLink`] if the link dangles
    /// - [`ScriptGrabError::PublishError`] if there is no symlink at the path
    pub async fn verify(&self) -> Result<PathBuf> {
        match self.resolve().await? {
            LinkState::Valid {
                target,
            } => Ok(target),
            LinkState::Stale {
                target,
            } => Err(ScriptGrabError::StaleLink {
                link: self.link.display().to_string(),
                target: target.display().to_string(),
            }
            .into()),
            LinkState::Missing => Err(self.error("no symlink exists at this path", false)),
            LinkState::NotSymlink => {
                Err(self.error("path exists but is not a symlink", false))
            }
        }
    }

    /// Replace whatever is at the public path with a symlink to `target`.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::PublishError`]; `link_removed` is set when the old
    /// entry was already gone at the time linking failed.
    pub async fn publish(&self, target: &Path) -> Result<()> {
        let target = std::path::absolute(target).map_err(|e| self.error(&e.to_string(), false))?;
        let removed = self.remove_existing().await?;

        if let Err(e) = self.create_link(&target).await {
            let reason = if removed {
                format!("previous link was removed, the global command is now unavailable: {e}")
            } else {
                e.to_string()
            };
            return Err(self.error(&reason, removed));
        }

        tracing::info!("Published {} -> {}", self.link.display(), target.display());
        Ok(())
    }

    async fn remove_existing(&self) -> Result<bool> {
        let metadata = match tokio::fs::symlink_metadata(&self.link).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.error(&e.to_string(), false)),
        };

        if metadata.is_dir() {
            return Err(self.error("refusing to replace a directory with a symlink", false));
        }

        match tokio::fs::remove_file(&self.link).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::PermissionDenied && self.elevate => {
                tracing::debug!("Removing {} needs elevation", self.link.display());
                let link = self.link.display().to_string();
                run_elevated(&["rm", "-f", &link]).await.map_err(|e| self.error(&e, false))?;
                Ok(true)
            }
            Err(e) => Err(self.error(&e.to_string(), false)),
        }
    }

    async fn create_link(&self, target: &Path) -> Result<(), String> {
        if let Some(parent) = self.link.parent() {
            if !parent.exists() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    if e.kind() == ErrorKind::PermissionDenied && self.elevate {
                        let parent = parent.display().to_string();
                        run_elevated(&["mkdir", "-p", &parent]).await?;
                    } else {
                        return Err(e.to_string());
                    }
                }
            }
        }

        match tokio::fs::symlink(target, &self.link).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied && self.elevate => {
                tracing::debug!("Linking {} needs elevation", self.link.display());
                let target = target.display().to_string();
                let link = self.link.display().to_string();
                run_elevated(&["ln", "-s", &target, &link]).await
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn error(&self, reason: &str, link_removed: bool) -> anyhow::Error {
        ScriptGrabError::PublishError {
            link: self.link.display().to_string(),
            reason: reason.to_string(),
            link_removed,
        }
        .into()
    }
}

// Failures come back as a one-line reason for PublishError
async fn run_elevated(args: &[&str]) -> Result<(), String> {
    let result = ProcessCommand::new("sudo")
        .args(args.iter().copied())
        .echo(Echo::Full)
        .run()
        .await
        .map_err(|e| e.to_string())?;

    if result.success() {
        Ok(())
    } else {
        let stderr = result.stderr.trim();
        Err(if stderr.is_empty() {
            format!("sudo {} exited with {:?}", args.join(" "), result.code())
        } else {
            stderr.to_string()
        })
    }
}
