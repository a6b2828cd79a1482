//! `scriptgrab self-update`

use anyhow::Result;
use clap::Args;

use crate::config::GlobalConfig;
use crate::fetch::HttpFetcher;
use crate::process::print_captured;
use crate::store::PayloadStore;
use crate::upgrade::SelfUpdater;

/// Fetch the remote update script and execute it.
///
/// The script runs unsandboxed with the invoking user's privileges. Its output is
/// printed as-is; a non-zero exit from the script does not fail this command.
#[derive(Args, Debug)]
pub struct SelfUpdateCommand {
    /// Allow executing the fetched script (or set self_update.trusted in the config)
    #[arg(long)]
    trust_remote_code: bool,
}

impl SelfUpdateCommand {
    /// Run the self-update with `config`.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let settings = config.self_update.clone();
        let fetcher = HttpFetcher::new(settings.timeout())?;
        let updater = SelfUpdater::new(fetcher, settings).trust_remote_code(self.trust_remote_code);

        let _lock = PayloadStore::from_config(config).lock().await?;
        let result = updater.run_self_update().await?;
        print_captured(&result);

        if !result.success() {
            tracing::warn!("Update script exited with {:?}", result.code());
        }
        Ok(())
    }
}
