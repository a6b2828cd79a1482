//! Error handling for scriptgrab
//!
//! Two layers, mirroring how the CLI reports failures:
//! - [`ScriptGrabError`] - one variant per failure mode of the install, update and
//!   self-update lifecycle, carried through `anyhow::Result` in library code
//! - [`ErrorContext`] - the rendered form shown to the operator: a single `error:`
//!   line, optionally followed by a `hint:` line
//!
//! [`user_friendly_error`] converts whatever reached `main` into an [`ErrorContext`],
//! and [`exit_code`] decides the process status.
//!
//! # Examples
//!
//! ```rust,no_run
//! use scriptgrab::core::{ScriptGrabError, user_friendly_error};
//!
//! let err = anyhow::Error::from(ScriptGrabError::NotInstalled {
//!     path: "/home/me/scriptgrab".to_string(),
//! });
//! let ctx = user_friendly_error(err);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Exit status for every handled failure.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status after the operator interrupted the run (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Failure while retrieving a remote resource over HTTPS.
///
/// Each variant names the URL so the diagnostic stays useful on its own. No
/// variant ever carries partially downloaded bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("timed out after {secs}s fetching {url}")]
    Timeout {
        /// Requested URL
        url: String,
        /// Timeout that was exceeded
        secs: u64,
    },

    /// Connection, DNS, TLS or body-read failure.
    #[error("could not fetch {url}: {reason}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The HTTP client could not be set up; nothing was requested.
    #[error("could not initialize the HTTP client: {reason}")]
    Client {
        /// Underlying cause
        reason: String,
    },

    /// The URL is malformed or not HTTPS.
    #[error("invalid fetch URL '{url}': {reason}")]
    InvalidUrl {
        /// Rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// The main error type for scriptgrab operations.
///
/// Every variant is terminal for the current invocation; nothing is retried.
#[derive(Error, Debug)]
pub enum ScriptGrabError {
    /// The store root already exists; install never merges into it.
    #[error("'{path}' already exists, refusing to overwrite an existing install")]
    AlreadyInstalled {
        /// Store root
        path: String,
    },

    /// Update was requested but nothing is installed.
    #[error("'{path}' does not exist, scriptgrab is not installed")]
    NotInstalled {
        /// Store root
        path: String,
    },

    /// The payload does not contain the expected entry point.
    #[error("can't find launcher '{launcher}' in {root}")]
    LauncherNotFound {
        /// Launcher path relative to the store root
        launcher: String,
        /// Directory that was searched
        root: String,
    },

    /// Local history is not an ancestor of the remote history.
    #[error("local history in '{path}' has diverged from {upstream}, refusing to update")]
    DivergedHistory {
        /// Store root
        path: String,
        /// Upstream ref that could not be fast-forwarded to
        upstream: String,
    },

    /// Remote fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Permission bits could not be changed.
    #[error("cannot change permissions of '{path}': {reason}")]
    PermissionError {
        /// File whose mode could not be changed
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The global command link could not be published.
    #[error("failed to publish '{link}': {reason}")]
    PublishError {
        /// Fixed public path
        link: String,
        /// Underlying cause
        reason: String,
        /// Whether the previous link was already removed when the failure happened
        link_removed: bool,
    },

    /// The global command link points at something that no longer exists.
    #[error("'{link}' points to missing launcher '{target}'")]
    StaleLink {
        /// Fixed public path
        link: String,
        /// Dangling target
        target: String,
    },

    /// Git executable is not on `PATH`.
    #[error("git is not installed or not found in PATH")]
    GitNotFound,

    /// A git command exited unsuccessfully.
    #[error("git {operation} failed: {stderr}")]
    GitCommandError {
        /// Git subcommand
        operation: String,
        /// Captured stderr
        stderr: String,
    },

    /// `git clone` failed.
    #[error("failed to clone {url}: {reason}")]
    GitCloneFailed {
        /// Repository URL
        url: String,
        /// Captured stderr
        reason: String,
    },

    /// An external program required for the operation is missing.
    #[error("'{program}' is not installed or not found in PATH")]
    ProgramNotFound {
        /// Program name
        program: String,
    },

    /// An external command exceeded its timeout and was killed.
    #[error("'{command}' timed out after {secs}s")]
    ProcessTimeout {
        /// Command line
        command: String,
        /// Timeout that was exceeded
        secs: u64,
    },

    /// A fetched script did not match the pinned checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Script URL
        url: String,
        /// Configured digest
        expected: String,
        /// Digest of the fetched body
        actual: String,
    },

    /// Self-update was requested without the remote-code capability.
    #[error("self-update executes unverified remote code and was not authorized")]
    SelfUpdateNotTrusted,

    /// Another scriptgrab process holds the store lock.
    #[error("another scriptgrab process is operating on '{path}'")]
    StoreLocked {
        /// Store root
        path: String,
    },

    /// Configuration file is invalid.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description
        message: String,
    },

    /// The operator pressed Ctrl-C.
    #[error("aborted by user")]
    Interrupted,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Message
        message: String,
    },
}

/// Rendered error with an optional operator hint.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ScriptGrabError,
    /// Optional next step for the operator
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without a suggestion.
    #[must_use]
    pub const fn new(error: ScriptGrabError) -> Self {
        Self {
            error,
            suggestion: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "hint".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nHint: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Process exit status for an error that reached `main`.
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ScriptGrabError>() {
        Some(ScriptGrabError::Interrupted) => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

/// Convert any error to a user-facing [`ErrorContext`].
///
/// Typed errors get a tailored hint. Other errors are flattened into a single
/// line with their causes joined by `: `, so the diagnostic stays on one line.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<ScriptGrabError>() {
        Ok(typed) => return create_error_context(typed),
        Err(error) => error,
    };

    if let Some(fetch_error) = error.downcast_ref::<FetchError>() {
        return create_error_context(ScriptGrabError::Fetch(fetch_error.clone()));
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(ScriptGrabError::Other {
                message: flatten_chain(&error),
            })
            .with_suggestion("Check file ownership or re-run with sufficient privileges");
        }
    }

    ErrorContext::new(ScriptGrabError::Other {
        message: flatten_chain(&error),
    })
}

fn flatten_chain(error: &anyhow::Error) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}

fn create_error_context(error: ScriptGrabError) -> ErrorContext {
    let suggestion = match &error {
        ScriptGrabError::AlreadyInstalled {
            path,
        } => Some(format!(
            "Remove '{path}' or set store_root to another location, then re-run install"
        )),
        ScriptGrabError::NotInstalled {
            ..
        } => Some("Run 'scriptgrab install' first".to_string()),
        ScriptGrabError::LauncherNotFound {
            ..
        } => Some("Check the launcher setting matches the repository layout".to_string()),
        ScriptGrabError::DivergedHistory {
            path,
            ..
        } => Some(format!(
            "Commit or discard your local changes in '{path}', or remove it and reinstall"
        )),
        ScriptGrabError::Fetch(FetchError::Timeout {
            ..
        }) => Some("Check your connection or raise self_update.timeout_secs".to_string()),
        ScriptGrabError::Fetch(FetchError::Client {
            ..
        }) => Some("Check the system TLS certificates and proxy settings".to_string()),
        ScriptGrabError::Fetch(_) => Some("Check your network connection and the URL".to_string()),
        ScriptGrabError::PublishError {
            link,
            link_removed: true,
            ..
        } => Some(format!(
            "The global command is now unavailable; recreate '{link}' by re-running install"
        )),
        ScriptGrabError::PublishError {
            ..
        } => Some("Re-run with sufficient privileges or enable publish.elevate".to_string()),
        ScriptGrabError::StaleLink {
            ..
        } => Some("Remove the store and run 'scriptgrab install' again".to_string()),
        ScriptGrabError::GitNotFound => {
            Some("Install git from https://git-scm.com/ and make sure it is in PATH".to_string())
        }
        ScriptGrabError::ProgramNotFound {
            program,
        } => Some(format!("Install '{program}' or change the configured interpreter")),
        ScriptGrabError::ChecksumMismatch {
            ..
        } => Some("Do not run the script; update self_update.sha256 only if you trust the new content".to_string()),
        ScriptGrabError::SelfUpdateNotTrusted => Some(
            "Pass --trust-remote-code or set self_update.trusted = true in the config".to_string(),
        ),
        ScriptGrabError::StoreLocked {
            ..
        } => Some("Wait for the other scriptgrab process to finish".to_string()),
        ScriptGrabError::ConfigError {
            ..
        }
        | ScriptGrabError::TomlError(_) => {
            Some("Fix the configuration file or regenerate it with 'scriptgrab config init --force'".to_string())
        }
        _ => None,
    };

    let ctx = ErrorContext::new(error);
    match suggestion {
        Some(suggestion) => ctx.with_suggestion(suggestion),
        None => ctx,
    }
}
