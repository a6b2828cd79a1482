//! `scriptgrab install`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::installer::Installer;

/// Clone the payload into the store and publish the launcher.
///
/// Refuses to run if the store root already exists; remove it first to reinstall.
#[derive(Args, Debug)]
pub struct InstallCommand {}

impl InstallCommand {
    /// Run the install with `config`.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        println!("{} {}", "Installing ScriptGrab from".bold(), config.repo_url);

        let report = Installer::from_config(config).install().await?;

        println!("\n{} ScriptGrab installed in {}", "✅".green(), report.store_root.display());
        println!("   {} -> {}", report.link.display(), report.launcher.display());
        if let Some(name) = report.link.file_name() {
            println!("   Run '{}' to start", name.to_string_lossy().cyan());
        }
        Ok(())
    }
}
