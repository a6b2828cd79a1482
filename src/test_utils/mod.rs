//! Test utilities for scriptgrab
//!
//! Helpers for unit and integration tests: local git repositories standing in
//! for the payload remote, an isolated [`TestEnvironment`], an in-memory
//! [`StaticFetcher`], and one-time logging setup.
//!
//! Available under `#[cfg(test)]` and the `test-utils` feature.

pub mod environment;
pub mod fixtures;
pub mod git_helper;

pub use environment::TestEnvironment;
pub use fixtures::{LAUNCHER_SCRIPT, PayloadFixture};
pub use git_helper::TestGit;

use crate::core::FetchError;
use crate::fetch::{RemoteFetcher, RemoteResource};
use std::cell::Cell;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Route `tracing` output to the test harness, once per process.
///
/// `level` wins over `RUST_LOG`; with neither set, nothing is logged.
pub fn init_test_logging(level: Option<Level>) {
    LOGGING.call_once(|| {
        let filter = match level {
            Some(level) => EnvFilter::new(level.as_str()),
            None => match EnvFilter::try_from_default_env() {
                Ok(filter) => filter,
                Err(_) => return,
            },
        };
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// [`RemoteFetcher`] returning a canned response and counting calls.
pub struct StaticFetcher {
    response: Result<Vec<u8>, FetchError>,
    calls: Cell<usize>,
}

impl StaticFetcher {
    /// Serve `body` for every URL.
    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            response: Ok(body.into()),
            calls: Cell::new(0),
        }
    }

    /// Fail every fetch with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self {
            response: Err(error),
            calls: Cell::new(0),
        }
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl RemoteFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<RemoteResource, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.response.clone().map(|bytes| RemoteResource {
            url: url.to_string(),
            bytes,
        })
    }
}
