//! `scriptgrab status`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::core::ScriptGrabError;
use crate::git::PayloadRepo;
use crate::publish::{GlobalCommandLink, LinkState};
use crate::store::PayloadStore;

/// Report the store and global command state.
///
/// Exits non-zero when the install is incomplete: missing store, missing
/// launcher, or a global command that is absent, not a symlink, or stale.
#[derive(Args, Debug)]
pub struct StatusCommand {}

impl StatusCommand {
    /// Inspect the install described by `config`.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let store = PayloadStore::from_config(config);
        let link = GlobalCommandLink::from_config(config);
        let root = store.root();

        println!("{}", "ScriptGrab status".bold());

        if !store.exists() {
            println!("  store:    {} ({})", root.display(), "not installed".red());
            return Err(ScriptGrabError::NotInstalled {
                path: root.display().to_string(),
            }
            .into());
        }

        let commit = PayloadRepo::new(root).head().await.ok();
        println!(
            "  store:    {} ({})",
            root.display(),
            commit.as_deref().map_or("unknown commit", |c| c.get(..7).unwrap_or(c))
        );

        let launcher = store.launcher_relative();
        if !store.is_installed() {
            println!("  launcher: {} ({})", launcher.display(), "missing".red());
            return Err(ScriptGrabError::LauncherNotFound {
                launcher: launcher.display().to_string(),
                root: root.display().to_string(),
            }
            .into());
        }
        let mode = if store.is_executable(launcher) {
            "executable".green()
        } else {
            "not executable".yellow()
        };
        println!("  launcher: {} ({})", launcher.display(), mode);

        let link_path = link.link_path();
        match link.resolve().await? {
            LinkState::Valid {
                target,
            } => {
                println!("  link:     {} -> {} ({})", link_path.display(), target.display(), "valid".green());
                if target != store.launcher_path() {
                    println!("            {}", "points outside the configured store".yellow());
                }
                Ok(())
            }
            LinkState::Stale {
                target,
            } => {
                println!("  link:     {} -> {} ({})", link_path.display(), target.display(), "stale".red());
                Err(ScriptGrabError::StaleLink {
                    link: link_path.display().to_string(),
                    target: target.display().to_string(),
                }
                .into())
            }
            LinkState::Missing => {
                println!("  link:     {} ({})", link_path.display(), "missing".red());
                Err(ScriptGrabError::Other {
                    message: format!("global command '{}' is not published", link_path.display()),
                }
                .into())
            }
            LinkState::NotSymlink => {
                println!("  link:     {} ({})", link_path.display(), "not a symlink".red());
                Err(ScriptGrabError::Other {
                    message: format!("'{}' exists but is not a symlink", link_path.display()),
                }
                .into())
            }
        }
    }
}
