//! External command execution with captured output.
//!
//! Every subprocess scriptgrab starts (git, `sudo` for link publishing, the
//! self-update script) goes through [`ProcessCommand`]. Output is fully captured;
//! depending on [`Echo`] the command line is printed before execution, captured
//! stdout after completion, and stderr (when non-empty) after stdout. This echo is
//! the operator-facing trace of what the tool did.
//!
//! Children are spawned with `kill_on_drop`, so dropping the future that runs a
//! command (Ctrl-C handling in `main`, or a timeout) also kills the child.
//!
//! # Examples
//!
//! ```rust,no_run
//! use scriptgrab::process::{Echo, ProcessCommand};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let result = ProcessCommand::new("git")
//!     .args(["--version"])
//!     .echo(Echo::Silent)
//!     .run()
//!     .await?;
//! assert!(result.success());
//! # Ok(())
//! # }
//! ```

use crate::core::ScriptGrabError;
use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// How much of a command's execution is echoed to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Echo {
    /// Print nothing.
    Silent,
    /// Print only the `$ command` line.
    CommandOnly,
    /// Print the command line, then captured stdout, then captured stderr.
    #[default]
    Full,
}

/// Outcome of a subprocess invocation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit status of the child
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl ExecutionResult {
    /// Whether the child exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` when the child was killed by a signal.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Builder for a single external command.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Option<Duration>,
    echo: Echo,
}

impl ProcessCommand {
    /// Start building a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: None,
            echo: Echo::default(),
        }
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

    /// Run the child in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Kill the child and fail with [`ScriptGrabError::ProcessTimeout`] after `duration`.
    pub const fn timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Choose what is echoed to the operator.
    pub const fn echo(mut self, echo: Echo) -> Self {
        self.echo = echo;
        self
    }

    /// The command line as it is echoed.
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and return the captured output.
    ///
    /// A non-zero exit status is not an error here; callers decide what it means.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::ProgramNotFound`] if the program cannot be spawned because it does not exist
    /// - [`ScriptGrabError::ProcessTimeout`] if the configured timeout elapses (the child is killed)
    /// - [`ScriptGrabError::IoError`] for any other spawn or wait failure
    pub async fn run(self) -> Result<ExecutionResult> {
        let line = self.display_line();
        if self.echo != Echo::Silent {
            println!("  {} {}", "$".dimmed(), line);
        }
        tracing::debug!(target: "process", "Executing command: {}", line);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|e| -> anyhow::Error {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScriptGrabError::ProgramNotFound {
                    program: self.program.clone(),
                }
                .into()
            } else {
                ScriptGrabError::IoError(e).into()
            }
        })?;

        let output_future = child.wait_with_output();
        let output = match self.timeout_duration {
            Some(duration) => match tokio::time::timeout(duration, output_future).await {
                Ok(result) => result.map_err(ScriptGrabError::IoError)?,
                Err(_) => {
                    tracing::warn!(
                        target: "process",
                        "Command timed out after {} seconds: {}",
                        duration.as_secs(),
                        line
                    );
                    return Err(ScriptGrabError::ProcessTimeout {
                        command: line,
                        secs: duration.as_secs(),
                    }
                    .into());
                }
            },
            None => output_future.await.map_err(ScriptGrabError::IoError)?,
        };

        let result = ExecutionResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(target: "process", "Command exited with {:?}: {}", result.code(), line);

        if self.echo == Echo::Full {
            print_captured(&result);
        }

        Ok(result)
    }
}

/// Print captured stdout, then stderr if it is non-empty.
pub fn print_captured(result: &ExecutionResult) {
    let stdout = result.stdout.trim_end();
    if !stdout.is_empty() {
        println!("{stdout}");
    }
    let stderr = result.stderr.trim_end();
    if !stderr.is_empty() {
        eprintln!("{stderr}");
    }
}
