//! `scriptgrab config`

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;

/// Show, locate, or initialize the configuration file.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the effective configuration (the default)
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Run the subcommand against the resolved configuration path.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let path = GlobalConfig::resolve_path(config_path)?;
        match self.command.unwrap_or(ConfigSubcommands::Show) {
            ConfigSubcommands::Show => Self::show(path).await,
            ConfigSubcommands::Path => {
                println!("{}", path.display());
                Ok(())
            }
            ConfigSubcommands::Init {
                force,
            } => Self::init(path, force).await,
        }
    }

    async fn show(path: PathBuf) -> Result<()> {
        let exists = path.exists();
        let config = GlobalConfig::load_with_optional(Some(path.clone())).await?;

        println!("{}", "Configuration".bold());
        if exists {
            println!("Location: {}\n", path.display());
        } else {
            println!("Location: {} {}\n", path.display(), "(not found, using defaults)".dimmed());
        }
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }

    async fn init(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            println!("❌ Config already exists at: {}", path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        GlobalConfig::default().save_to(&path).await?;
        println!("✅ Created config at: {}", path.display());
        Ok(())
    }
}
