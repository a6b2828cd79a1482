//! Type-safe Git command builder for consistent command execution
//!
//! Builds git invocations on top of [`ProcessCommand`] and maps failures to
//! typed [`ScriptGrabError`] variants, so callers never inspect stderr themselves.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::ScriptGrabError;
use crate::process::{Echo, ExecutionResult, ProcessCommand};

/// Builder for a single git invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use scriptgrab::git::command_builder::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let head = GitCommand::current_commit()
///     .current_dir("/home/me/scriptgrab")
///     .execute_stdout()
///     .await?;
/// println!("HEAD is {head}");
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: none (clone and fetch set one from configuration)
/// - **Echo**: silent; state-changing commands opt into [`Echo::Full`]
/// - **Working directory**: passed as `git -C <dir>`
pub struct GitCommand {
    /// Command arguments (e.g. `["clone", url, path]`)
    args: Vec<String>,

    /// Repository directory, passed via `-C`
    current_dir: Option<PathBuf>,

    /// Maximum duration before the child is killed
    timeout_duration: Option<Duration>,

    /// What to echo to the operator
    echo: Echo,

    /// For clone commands, the URL for error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout_duration: None,
            echo: Echo::Silent,
            clone_url: None,
        }
    }
}

impl GitCommand {
    /// Create an empty git command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run against the repository at `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a timeout (None for no timeout).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Choose what is echoed to the operator.
    pub const fn echo(mut self, echo: Echo) -> Self {
        self.echo = echo;
        self
    }

    fn full_args(&self) -> Vec<String> {
        let mut full_args = Vec::with_capacity(self.args.len() + 2);
        if let Some(dir) = &self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        full_args
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    /// Run git and return the raw result without interpreting the exit status.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitNotFound`] if git is missing, [`ScriptGrabError::ProcessTimeout`]
    /// on timeout, or an I/O error.
    pub async fn output(&self) -> Result<ExecutionResult> {
        let result = ProcessCommand::new("git")
            .args(self.full_args())
            .env("GIT_TERMINAL_PROMPT", "0")
            .timeout(self.timeout_duration)
            .echo(self.echo)
            .run()
            .await;

        match result {
            Err(e)
                if matches!(
                    e.downcast_ref::<ScriptGrabError>(),
                    Some(ScriptGrabError::ProgramNotFound { .. })
                ) =>
            {
                Err(ScriptGrabError::GitNotFound.into())
            }
            other => other,
        }
    }

    /// Run git and fail with a typed error on a non-zero exit.
    ///
    /// # Errors
    ///
    /// [`ScriptGrabError::GitCloneFailed`] for clone, [`ScriptGrabError::GitCommandError`]
    /// for everything else, plus the errors of [`output`](Self::output).
    pub async fn execute(self) -> Result<ExecutionResult> {
        let result = self.output().await?;
        if result.success() {
            return Ok(result);
        }

        tracing::debug!(
            target: "git",
            "Command failed with exit code {:?}: {}",
            result.code(),
            result.stderr.trim()
        );

        let stderr = if result.stderr.trim().is_empty() {
            result.stdout.trim().to_string()
        } else {
            result.stderr.trim().to_string()
        };

        let operation = self.operation();
        let error = match self.clone_url {
            Some(url) => ScriptGrabError::GitCloneFailed {
                url,
                reason: stderr,
            },
            None => ScriptGrabError::GitCommandError {
                operation,
                stderr,
            },
        };
        Err(error.into())
    }

    /// Run git and return trimmed stdout.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn execute_stdout(self) -> Result<String> {
        let result = self.execute().await?;
        Ok(result.stdout.trim().to_string())
    }

    /// Run a predicate command: exit 0 is `true`, exit 1 is `false`.
    ///
    /// # Errors
    ///
    /// Any other exit status is a [`ScriptGrabError::GitCommandError`].
    pub async fn execute_check(self) -> Result<bool> {
        let result = self.output().await?;
        match result.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(ScriptGrabError::GitCommandError {
                operation: self.operation(),
                stderr: result.stderr.trim().to_string(),
            }
            .into()),
        }
    }
}

// Convenience builders for the operations the lifecycle needs

impl GitCommand {
    /// `git clone <url> <target>`
    pub fn clone(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args(["clone", url]).arg(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// `git fetch --prune origin`
    pub fn fetch() -> Self {
        Self::new().args(["fetch", "--prune", "origin"])
    }

    /// `git merge --ff-only <upstream>`
    pub fn merge_ff_only(upstream: &str) -> Self {
        Self::new().args(["merge", "--ff-only", upstream])
    }

    /// `git merge-base --is-ancestor <ancestor> <descendant>`
    pub fn is_ancestor(ancestor: &str, descendant: &str) -> Self {
        Self::new().args(["merge-base", "--is-ancestor", ancestor, descendant])
    }

    /// `git rev-parse HEAD`
    pub fn current_commit() -> Self {
        Self::new().args(["rev-parse", "HEAD"])
    }

    /// `git rev-parse <ref>`
    pub fn rev_parse(ref_name: &str) -> Self {
        Self::new().args(["rev-parse", ref_name])
    }

    /// `git rev-parse --abbrev-ref --symbolic-full-name @{u}`
    pub fn upstream_name() -> Self {
        Self::new().args(["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
    }

    /// `git config <key> <value>` in the repository's local config
    pub fn config_set(key: &str, value: &str) -> Self {
        Self::new().args(["config", "--local", key, value])
    }
}
