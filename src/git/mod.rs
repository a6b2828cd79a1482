//! Git operations on the payload store.
//!
//! scriptgrab shells out to the system `git` binary rather than embedding a git
//! library, so the operator's credential helpers, SSH agent and proxy settings
//! all apply. Every invocation goes through [`command_builder::GitCommand`],
//! which runs it via [`crate::process`] and maps failures to typed errors.
//!
//! The payload is synchronized with a fast-forward-only policy:
//!
//! - `git fetch` updates the remote-tracking branch
//! - if the upstream tip is already an ancestor of `HEAD`, nothing changes
//! - if `HEAD` is an ancestor of the upstream tip, `git merge --ff-only` advances it
//! - anything else is divergent history and is left untouched
//!
//! # Examples
//!
//! ```rust,no_run
//! use scriptgrab::git::PayloadRepo;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let repo = PayloadRepo::clone(
//!     "https://github.com/devmesis/scriptgrab",
//!     "/tmp/scriptgrab",
//!     Some(Duration::from_secs(300)),
//! )
//! .await?;
//! println!("checked out {}", repo.head().await?);
//! # Ok(())
//! # }
//! ```

pub mod command_builder;

use crate::core::ScriptGrabError;
use crate::process::Echo;
use anyhow::{Context, Result};
use command_builder::GitCommand;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Relationship between the local `HEAD` and its upstream after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    /// Upstream is contained in local history; nothing to do.
    UpToDate,
    /// Local `HEAD` is behind upstream and can fast-forward.
    Behind,
    /// Neither contains the other.
    Diverged,
}

/// Handle to a git working tree used as the payload store.
#[derive(Debug)]
pub struct PayloadRepo {
    path: PathBuf,
}

impl PayloadRepo {
    /// Wrap an existing working tree. The path is not validated.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Clone `url` into `target`, echoing the command and its output.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitCloneFailed`] if git rejects the clone,
    /// [`ScriptGrabError::GitNotFound`] if git is missing, or
    /// [`ScriptGrabError::ProcessTimeout`] if `timeout` elapses.
    pub async fn clone(url: &str, target: impl AsRef<Path>, timeout: Option<Duration>) -> Result<Self> {
        let target = target.as_ref();
        GitCommand::clone(url, target).with_timeout(timeout).echo(Echo::Full).execute().await?;
        tracing::debug!(target: "git", "Cloned {} into {}", url, target.display());
        Ok(Self::new(target))
    }

    /// Working tree root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path looks like a git working tree.
    #[must_use]
    pub fn is_git_repo(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Stop git from tracking execute bits in this working tree.
    ///
    /// The launcher is made executable after checkout; with file modes tracked
    /// that shows up as a local change and blocks any later merge touching it.
    pub async fn ignore_file_modes(&self) -> Result<()> {
        GitCommand::config_set("core.fileMode", "false")
            .current_dir(&self.path)
            .execute()
            .await
            .context("Failed to disable file mode tracking")?;
        Ok(())
    }

    /// Update remote-tracking branches from `origin`.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitCommandError`] if the fetch fails.
    pub async fn fetch(&self, timeout: Option<Duration>) -> Result<()> {
        GitCommand::fetch()
            .current_dir(&self.path)
            .with_timeout(timeout)
            .echo(Echo::Full)
            .execute()
            .await?;
        Ok(())
    }

    /// Commit hash of `HEAD`.
    pub async fn head(&self) -> Result<String> {
        GitCommand::current_commit()
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .context("Failed to get current commit")
    }

    /// Short name of the upstream branch, e.g. `origin/main`.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitCommandError`] if the current branch has no upstream.
    pub async fn upstream(&self) -> Result<String> {
        GitCommand::upstream_name()
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .context("Current branch has no upstream")
    }

    /// Commit hash of an arbitrary ref.
    pub async fn resolve_ref(&self, ref_name: &str) -> Result<String> {
        GitCommand::rev_parse(ref_name)
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .with_context(|| format!("Failed to resolve {ref_name}"))
    }

    /// Whether `ancestor` is reachable from `descendant`.
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        GitCommand::is_ancestor(ancestor, descendant).current_dir(&self.path).execute_check().await
    }

    /// Classify `HEAD` against `upstream`.
    pub async fn ancestry(&self, upstream: &str) -> Result<Ancestry> {
        if self.is_ancestor(upstream, "HEAD").await? {
            return Ok(Ancestry::UpToDate);
        }
        if self.is_ancestor("HEAD", upstream).await? {
            return Ok(Ancestry::Behind);
        }
        Ok(Ancestry::Diverged)
    }

    /// Advance `HEAD` to `upstream`, refusing anything but a fast-forward.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitCommandError`] if git refuses the merge.
    pub async fn fast_forward(&self, upstream: &str) -> Result<()> {
        GitCommand::merge_ff_only(upstream)
            .current_dir(&self.path)
            .echo(Echo::Full)
            .execute()
            .await?;
        Ok(())
    }
}

/// Whether a `git` executable is on `PATH`.
#[must_use]
pub fn is_git_installed() -> bool {
    which::which("git").is_ok()
}

/// Fail with [`ScriptGrabError::GitNotFound`] when git is missing.
pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(ScriptGrabError::GitNotFound.into());
    }
    Ok(())
}
