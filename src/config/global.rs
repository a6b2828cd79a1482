//! Global configuration for scriptgrab.
//!
//! The configuration file is optional: when it does not exist every setting
//! takes its built-in default, which matches the upstream ScriptGrab layout.
//!
//! # Location
//!
//! Resolved in this order:
//! 1. an explicit path (`--config`)
//! 2. the `SCRIPTGRAB_CONFIG` environment variable
//! 3. `~/.scriptgrab/config.toml`
//!
//! # File Format
//!
//! ```toml
//! repo_url = "https://github.com/devmesis/scriptgrab"
//! store_root = "~/scriptgrab"
//! launcher = "scriptgrab.sh"
//! link_path = "/usr/local/bin/sg"
//!
//! [git]
//! timeout_secs = 300
//!
//! [self_update]
//! url = "https://raw.githubusercontent.com/devmesis/scriptgrab/main/scripts/Application/update.py"
//! interpreter = "python3"
//! timeout_secs = 30
//! trusted = false
//! # sha256 = "<hex digest of the expected script body>"
//!
//! [publish]
//! elevate = true
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_FETCH_TIMEOUT, DEFAULT_GIT_TIMEOUT, DEFAULT_INTERPRETER,
    DEFAULT_LAUNCHER, DEFAULT_LINK_PATH, DEFAULT_REPO_URL, DEFAULT_STORE_ROOT,
    DEFAULT_UPDATE_SCRIPT_URL,
};
use crate::core::ScriptGrabError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Settings for git operations against the payload repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Timeout in seconds for clone and fetch.
    pub timeout_secs: u64,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_GIT_TIMEOUT.as_secs(),
        }
    }
}

impl GitSettings {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the fetch-and-execute self-update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfUpdateSettings {
    /// HTTPS URL of the update script body.
    pub url: String,

    /// Program the script is passed to.
    pub interpreter: String,

    /// Fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Allow self-update without `--trust-remote-code`.
    pub trusted: bool,

    /// Expected SHA-256 of the script body (hex). Execution is refused on mismatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Default for SelfUpdateSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPDATE_SCRIPT_URL.to_string(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            trusted: false,
            sha256: None,
        }
    }
}

impl SelfUpdateSettings {
    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for publishing the global command link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Retry through `sudo` when the link directory is not writable.
    pub elevate: bool,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            elevate: true,
        }
    }
}

/// Global configuration structure for scriptgrab.
///
/// # Examples
///
/// ```rust,no_run
/// use scriptgrab::config::GlobalConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = GlobalConfig::load_with_optional(None).await?;
/// println!("store root: {}", config.store_root_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Repository the payload store is cloned from.
    pub repo_url: String,

    /// Store root; `~` is expanded.
    pub store_root: String,

    /// Launcher path relative to the store root.
    pub launcher: String,

    /// Fixed public path of the global command link; `~` is expanded.
    pub link_path: String,

    /// Git settings.
    pub git: GitSettings,

    /// Self-update settings.
    pub self_update: SelfUpdateSettings,

    /// Publish settings.
    pub publish: PublishSettings,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            repo_url: DEFAULT_REPO_URL.to_string(),
            store_root: DEFAULT_STORE_ROOT.to_string(),
            launcher: DEFAULT_LAUNCHER.to_string(),
            link_path: DEFAULT_LINK_PATH.to_string(),
            git: GitSettings::default(),
            self_update: SelfUpdateSettings::default(),
            publish: PublishSettings::default(),
        }
    }
}

impl GlobalConfig {
    /// Default configuration file path: `~/.scriptgrab/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".scriptgrab").join("config.toml"))
    }

    /// Resolve the configuration path from an explicit value, the
    /// `SCRIPTGRAB_CONFIG` environment variable, or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if no explicit path is given and the home directory is unknown.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
            _ => Self::default_path(),
        }
    }

    /// Load from the resolved path, falling back to defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected, or the file exists but
    /// cannot be read, parsed, or validated.
    pub async fn load_with_optional(explicit: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(explicit)?;
        let exists = fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to access config at {}", path.display()))?;
        if exists {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or fails validation.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(ScriptGrabError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Reject settings that would make the lifecycle operations ambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptGrabError::ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> anyhow::Error {
            ScriptGrabError::ConfigError {
                message,
            }
            .into()
        };

        if self.repo_url.trim().is_empty() {
            return Err(invalid("repo_url must not be empty".to_string()));
        }
        if self.store_root.trim().is_empty() {
            return Err(invalid("store_root must not be empty".to_string()));
        }

        let launcher = Path::new(&self.launcher);
        if self.launcher.is_empty()
            || launcher.components().any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(invalid(format!(
                "launcher '{}' must be a relative path inside the store",
                self.launcher
            )));
        }

        if !self.link_path_buf().is_absolute() {
            return Err(invalid(format!("link_path '{}' must be absolute", self.link_path)));
        }
        if self.self_update.interpreter.trim().is_empty() {
            return Err(invalid("self_update.interpreter must not be empty".to_string()));
        }
        if self.self_update.timeout_secs == 0 || self.git.timeout_secs == 0 {
            return Err(invalid("timeouts must be at least one second".to_string()));
        }
        if let Some(digest) = &self.self_update.sha256 {
            let digest = digest.trim();
            let digest = digest.strip_prefix("sha256:").unwrap_or(digest);
            if digest.len() != 64 || hex::decode(digest).is_err() {
                return Err(invalid("self_update.sha256 must be 64 hex characters".to_string()));
            }
        }
        Ok(())
    }

    /// Store root with `~` expanded.
    #[must_use]
    pub fn store_root_path(&self) -> PathBuf {
        expand(&self.store_root)
    }

    /// Global command link path with `~` expanded.
    #[must_use]
    pub fn link_path_buf(&self) -> PathBuf {
        expand(&self.link_path)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_upstream_layout() {
        let config = GlobalConfig::default();
        assert_eq!(config.launcher, "scriptgrab.sh");
        assert_eq!(config.link_path, "/usr/local/bin/sg");
        assert!(!config.self_update.trusted);
        assert!(config.publish.elevate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_root_expands_tilde() {
        let config = GlobalConfig::default();
        let root = config.store_root_path();
        assert!(root.is_absolute());
        assert!(root.ends_with("scriptgrab"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn test_uninspectable_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("plain-file");
        std::fs::write(&not_a_dir, "").unwrap();

        let err = GlobalConfig::load_with_optional(Some(not_a_dir.join("config.toml")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to access config"), "{err:#}");
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "launcher = \"bin/run.sh\"\n[self_update]\ntrusted = true\n")
            .unwrap();

        let config = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(config.launcher, "bin/run.sh");
        assert!(config.self_update.trusted);
        assert_eq!(config.self_update.interpreter, "python3");
        assert_eq!(config.repo_url, DEFAULT_REPO_URL);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let mut config = GlobalConfig::default();
        config.store_root = "/opt/scriptgrab".to_string();

        config.save_to(&path).await.unwrap();
        let loaded = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.store_root, "/opt/scriptgrab");
    }

    #[tokio::test]
    async fn test_invalid_toml_is_typed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "launcher = [").unwrap();

        let err = GlobalConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ScriptGrabError>(), Some(ScriptGrabError::TomlError(_))));
    }

    #[test]
    fn test_launcher_escaping_store_rejected() {
        let config = GlobalConfig {
            launcher: "../evil.sh".to_string(),
            ..GlobalConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relative path inside the store"));

        let config = GlobalConfig {
            launcher: "/abs/launcher.sh".to_string(),
            ..GlobalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_link_path_rejected() {
        let config = GlobalConfig {
            link_path: "bin/sg".to_string(),
            ..GlobalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let mut config = GlobalConfig::default();
        config.self_update.sha256 = Some("abc".to_string());
        assert!(config.validate().is_err());

        config.self_update.sha256 = Some("a".repeat(64));
        assert!(config.validate().is_ok());

        config.self_update.sha256 = Some(format!("sha256:{}", "B".repeat(64)));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_overrides_default_path() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe { std::env::set_var(CONFIG_PATH_ENV, "/tmp/from-env.toml") };
        let resolved = GlobalConfig::resolve_path(None).unwrap();
        unsafe { std::env::remove_var(CONFIG_PATH_ENV) };

        assert_eq!(resolved, PathBuf::from("/tmp/from-env.toml"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/custom.toml");
        assert_eq!(GlobalConfig::resolve_path(Some(explicit.clone())).unwrap(), explicit);
    }
}
