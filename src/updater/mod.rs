//! Steady-state synchronization of an installed store.
//!
//! The updater fetches the remote and only ever fast-forwards. Local commits
//! that the remote does not contain make the update fail with
//! [`ScriptGrabError::DivergedHistory`], leaving the working tree untouched.
//! Running it again without remote changes is a no-op.

use crate::config::GlobalConfig;
use crate::core::ScriptGrabError;
use crate::git::{Ancestry, PayloadRepo, ensure_git_available};
use crate::store::PayloadStore;
use anyhow::Result;
use std::fmt;
use std::time::Duration;

/// Outcome of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The store already contained the remote tip.
    UpToDate {
        /// Current commit
        commit: String,
    },
    /// The store was advanced along the remote history.
    FastForwarded {
        /// Commit before the update
        from: String,
        /// Commit after the update
        to: String,
    },
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate {
                commit,
            } => write!(f, "already up to date at {}", short(commit)),
            Self::FastForwarded {
                from,
                to,
            } => write!(f, "updated {}..{}", short(from), short(to)),
        }
    }
}

fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

/// Fast-forward-only updater for one store.
#[derive(Debug, Clone)]
pub struct Updater {
    store: PayloadStore,
    git_timeout: Duration,
}

impl Updater {
    /// Create an updater for `store`.
    pub const fn new(store: PayloadStore, git_timeout: Duration) -> Self {
        Self {
            store,
            git_timeout,
        }
    }

    /// Updater described by the configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(PayloadStore::from_config(config), config.git.timeout())
    }

    /// Fetch and fast-forward the store, then re-apply the launcher's execute bit.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::NotInstalled`] if the store root is missing (nothing is created)
    /// - [`ScriptGrabError::StoreLocked`] if another invocation is running
    /// - [`ScriptGrabError::DivergedHistory`] if a fast-forward is impossible
    /// - git errors from fetching or merging
    pub async fn update(&self) -> Result<UpdateResult> {
        let root = self.store.root();
        if !self.store.exists() {
            return Err(ScriptGrabError::NotInstalled {
                path: root.display().to_string(),
            }
            .into());
        }
        let _lock = self.store.lock().await?;
        ensure_git_available()?;

        let repo = PayloadRepo::new(root);
        // Idempotent; also covers stores that were cloned by hand
        repo.ignore_file_modes().await?;
        repo.fetch(Some(self.git_timeout)).await?;
        let upstream = repo.upstream().await?;

        let result = match repo.ancestry(&upstream).await? {
            Ancestry::UpToDate => UpdateResult::UpToDate {
                commit: repo.head().await?,
            },
            Ancestry::Behind => {
                let from = repo.head().await?;
                repo.fast_forward(&upstream).await?;
                UpdateResult::FastForwarded {
                    from,
                    to: repo.head().await?,
                }
            }
            Ancestry::Diverged => {
                tracing::warn!("{} has diverged from {}", root.display(), upstream);
                return Err(ScriptGrabError::DivergedHistory {
                    path: root.display().to_string(),
                    upstream,
                }
                .into());
            }
        };

        if self.store.is_installed() {
            self.store.ensure_launcher_executable().await?;
        } else {
            tracing::warn!(
                "Launcher {} is missing after update",
                self.store.launcher_path().display()
            );
        }

        tracing::info!("{}: {}", root.display(), result);
        Ok(result)
    }
}
