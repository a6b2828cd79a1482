//! `scriptgrab update`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::updater::Updater;

/// Fast-forward the installed payload to the latest remote state.
#[derive(Args, Debug)]
pub struct UpdateCommand {}

impl UpdateCommand {
    /// Run the update with `config`.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        println!("{} {}", "Updating".bold(), config.store_root_path().display());

        let result = Updater::from_config(config).update().await?;
        println!("\n{} ScriptGrab {}", "✅".green(), result);
        Ok(())
    }
}
