//! scriptgrab command-line entry point.
//!
//! Parses arguments, installs logging, and runs the selected command on a
//! current-thread runtime. Ctrl-C drops the running command (killing any child
//! process and removing transient files) and exits with status 130.

use clap::Parser;
use scriptgrab::cli::Cli;
use scriptgrab::core::{EXIT_INTERRUPTED, ScriptGrabError, exit_code, user_friendly_error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = tokio::select! {
        result = cli.execute() => result,
        Ok(()) = tokio::signal::ctrl_c() => Err(ScriptGrabError::Interrupted.into()),
    };

    if let Err(e) = result {
        let code = exit_code(&e);
        if code == EXIT_INTERRUPTED {
            eprintln!("\nAborted by user.");
        } else {
            user_friendly_error(e).display();
        }
        std::process::exit(code);
    }
}
