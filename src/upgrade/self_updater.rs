use crate::config::SelfUpdateSettings;
use crate::core::ScriptGrabError;
use crate::fetch::RemoteFetcher;
use crate::process::{Echo, ExecutionResult, ProcessCommand};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fetches the update script and runs it as a child process.
///
/// The script body is written to a [`tempfile::NamedTempFile`] that lives only
/// for the duration of [`run_self_update`](Self::run_self_update); it is deleted
/// when that future completes, fails, or is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use scriptgrab::config::SelfUpdateSettings;
/// use scriptgrab::fetch::HttpFetcher;
/// use scriptgrab::upgrade::SelfUpdater;
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = SelfUpdateSettings::default();
/// let fetcher = HttpFetcher::new(settings.timeout())?;
/// let result = SelfUpdater::new(fetcher, settings).trust_remote_code(true).run_self_update().await?;
/// println!("{}", result.stdout);
/// # Ok(())
/// # }
/// ```
pub struct SelfUpdater<F> {
    fetcher: F,
    settings: SelfUpdateSettings,
    trust_flag: bool,
    temp_dir: Option<PathBuf>,
}

impl<F: RemoteFetcher> SelfUpdater<F> {
    /// Create a self-updater. Execution is refused until trust is granted either
    /// here or through `settings.trusted`.
    pub fn new(fetcher: F, settings: SelfUpdateSettings) -> Self {
        Self {
            fetcher,
            settings,
            trust_flag: false,
            temp_dir: None,
        }
    }

    /// Grant the remote-code capability for this run (`--trust-remote-code`).
    #[must_use]
    pub fn trust_remote_code(mut self, trust: bool) -> Self {
        self.trust_flag = trust;
        self
    }

    /// Write the transient script under `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Whether execution is authorized.
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.trust_flag || self.settings.trusted
    }

    /// Fetch, verify (when a digest is pinned), and execute the update script.
    ///
    /// The child's exit status and stderr are returned, not raised: a script that
    /// exits non-zero is still a completed self-update from scriptgrab's side.
    ///
    /// # Errors
    ///
    /// - [`ScriptGrabError::SelfUpdateNotTrusted`] before anything is fetched
    /// - [`ScriptGrabError::Fetch`] if the script cannot be retrieved
    /// - [`ScriptGrabError::ChecksumMismatch`] if the body does not match the pin
    /// - [`ScriptGrabError::ProgramNotFound`] if the interpreter is missing
    pub async fn run_self_update(&self) -> Result<ExecutionResult> {
        if !self.is_trusted() {
            return Err(ScriptGrabError::SelfUpdateNotTrusted.into());
        }

        let url = &self.settings.url;
        warn!("Self-update executes unverified remote code from {}", url);
        eprintln!(
            "{} executing remote code from {} without sandboxing",
            "warning:".yellow().bold(),
            url
        );

        let resource = self.fetcher.fetch(url).await.map_err(ScriptGrabError::Fetch)?;
        debug!("Fetched update script ({} bytes)", resource.bytes.len());

        if let Some(expected) = &self.settings.sha256 {
            super::verification::ChecksumVerifier::verify(&resource.bytes, expected, url)?;
        }

        let script = self.write_script(&resource.bytes)?;
        let result = ProcessCommand::new(&self.settings.interpreter)
            .arg(script.path().display().to_string())
            .echo(Echo::CommandOnly)
            .run()
            .await?;
        drop(script);

        info!("Update script exited with {:?}", result.code());
        Ok(result)
    }

    fn write_script(&self, bytes: &[u8]) -> Result<tempfile::NamedTempFile> {
        let suffix = script_suffix(&self.settings.url);
        let mut builder = tempfile::Builder::new();
        builder.prefix("scriptgrab-update-").suffix(&suffix);

        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create transient script file")?;

        file.write_all(bytes).context("Failed to write update script")?;
        file.flush()?;
        Ok(file)
    }
}

// Keep the script's extension so interpreters that care about it still work
fn script_suffix(url: &str) -> String {
    let name = url.split(['?', '#']).next().unwrap_or(url).rsplit('/').next().unwrap_or("");
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
