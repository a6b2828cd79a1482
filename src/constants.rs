//! Defaults for the install, update and self-update lifecycle.
//!
//! Every value here can be overridden in the global configuration file; see
//! [`crate::config::GlobalConfig`].

use std::time::Duration;

/// Repository the payload store is cloned from.
pub const DEFAULT_REPO_URL: &str = "https://github.com/devmesis/scriptgrab";

/// Store root, relative to the invoking user's home directory.
pub const DEFAULT_STORE_ROOT: &str = "~/scriptgrab";

/// Launcher entry point, relative to the store root.
pub const DEFAULT_LAUNCHER: &str = "scriptgrab.sh";

/// Fixed public path of the global command link.
pub const DEFAULT_LINK_PATH: &str = "/usr/local/bin/sg";

/// Raw URL of the self-update script body.
pub const DEFAULT_UPDATE_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/devmesis/scriptgrab/main/scripts/Application/update.py";

/// Interpreter used to execute the self-update script.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Timeout for fetching the self-update script (30 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for git clone and fetch (5 minutes).
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "SCRIPTGRAB_CONFIG";

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("scriptgrab/", env!("CARGO_PKG_VERSION"));
