//! Payload repository fixtures
//!
//! A [`PayloadFixture`] is a local git repository laid out like the upstream
//! ScriptGrab payload: a launcher at the root plus a couple of tool scripts.
//! It stands in for the remote during install and update tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::git_helper::TestGit;

/// Launcher body committed to the fixture. Committed without the execute bit so
/// tests can observe the installer adding it.
pub const LAUNCHER_SCRIPT: &str = "#!/bin/sh\necho \"scriptgrab launcher\"\n";

/// Local git repository acting as the payload remote.
pub struct PayloadFixture {
    path: PathBuf,
    git: TestGit,
}

impl PayloadFixture {
    /// Create the repository at `path` with `launcher` and one initial commit.
    pub fn create(path: impl AsRef<Path>, launcher: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(path.join("tools"))
            .with_context(|| format!("Failed to create fixture at {}", path.display()))?;

        let git = TestGit::new(&path);
        git.init()?;
        git.config_user()?;

        let launcher_path = path.join(launcher);
        if let Some(parent) = launcher_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&launcher_path, LAUNCHER_SCRIPT)?;
        fs::write(path.join("tools").join("passgen.sh"), "#!/bin/sh\necho hunter2\n")?;
        git.add_all()?;
        git.commit("Initial payload")?;

        Ok(Self {
            path,
            git,
        })
    }

    /// Repository directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone URL for the fixture (a plain local path).
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Commit hash at the fixture's `HEAD`.
    pub fn head(&self) -> Result<String> {
        self.git.rev_parse_head()
    }

    /// Write `relative` with `content` and commit it upstream.
    pub fn commit_file(&self, relative: &str, content: &str, message: &str) -> Result<String> {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, content)?;
        self.git.add_all()?;
        self.git.commit(message)?;
        self.git.rev_parse_head()
    }
}
