//! Raw git access for shaping fixture history
//!
//! Production code goes through [`crate::git`]; tests sometimes need history
//! the lifecycle would never create (local commits in the store, commits pushed
//! straight into the fixture remote). [`TestGit`] runs plain blocking git for that.

use anyhow::{Context, Result, ensure};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Blocking git runner for one working tree.
pub struct TestGit {
    dir: PathBuf,
}

impl TestGit {
    /// Bind to the working tree at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    /// Working tree root.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    // Runs `git <args>` in the working tree and returns stdout
    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| format!("could not spawn git {}", args.join(" ")))?;

        ensure!(
            output.status.success(),
            "git {} in {} exited with {:?}: {}",
            args.join(" "),
            self.dir.display(),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `git init`
    pub fn init(&self) -> Result<()> {
        self.git(&["init", "--quiet"]).map(drop)
    }

    /// Local identity for commits, with signing off.
    pub fn config_user(&self) -> Result<()> {
        for (key, value) in [
            ("user.name", "ScriptGrab Tests"),
            ("user.email", "tests@scriptgrab.invalid"),
            ("commit.gpgsign", "false"),
        ] {
            self.git(&["config", key, value])?;
        }
        Ok(())
    }

    /// Stage everything, mode changes included.
    pub fn add_all(&self) -> Result<()> {
        self.git(&["add", "--all"]).map(drop)
    }

    /// Commit what is staged.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--quiet", "-m", message]).map(drop)
    }

    /// Full hash of `HEAD`.
    pub fn rev_parse_head(&self) -> Result<String> {
        Ok(self.git(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    /// `git status --porcelain`; empty when the tree is clean.
    pub fn status_porcelain(&self) -> Result<String> {
        self.git(&["status", "--porcelain"])
    }
}
