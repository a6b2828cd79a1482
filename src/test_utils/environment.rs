//! Isolated lifecycle environment
//!
//! Everything an install/update test touches lives inside one temporary
//! directory: the payload remote, the store root, the link directory and the
//! configuration file.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fixtures::PayloadFixture;
use crate::config::GlobalConfig;

/// Test environment with a payload remote and a config pointing into a temp dir.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub remote: PayloadFixture,
    pub config: GlobalConfig,
}

impl TestEnvironment {
    /// Create a new environment. The store is not installed yet.
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("home"))?;
        fs::create_dir_all(root.join("bin"))?;

        let config = GlobalConfig::default();
        let remote = PayloadFixture::create(root.join("remote"), &config.launcher)?;

        let mut config = config;
        config.repo_url = remote.url();
        config.store_root = root.join("home").join("scriptgrab").display().to_string();
        config.link_path = root.join("bin").join("sg").display().to_string();
        config.publish.elevate = false;

        Ok(Self {
            temp_dir,
            remote,
            config,
        })
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Store root from the configuration.
    pub fn store_root(&self) -> PathBuf {
        self.config.store_root_path()
    }

    /// Global command link path from the configuration.
    pub fn link_path(&self) -> PathBuf {
        self.config.link_path_buf()
    }

    /// Launcher inside the store.
    pub fn launcher_path(&self) -> PathBuf {
        self.store_root().join(&self.config.launcher)
    }

    /// Write the configuration to `<temp>/config.toml` and return its path.
    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.root().join("config.toml");
        fs::write(&path, toml::to_string_pretty(&self.config)?)?;
        Ok(path)
    }
}
