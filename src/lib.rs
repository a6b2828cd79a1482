//! scriptgrab - installer, updater and self-updater for the ScriptGrab launcher
//!
//! scriptgrab places a launcher into a well-known global location, keeps its
//! backing payload in sync with a remote git repository, and can fetch and run
//! remote update logic on demand.
//!
//! # Lifecycle
//!
//! ```text
//! install      clone ──> chmod +x launcher ──> rename into store ──> publish link
//! update       fetch ──> fast-forward only ──> re-apply chmod +x
//! self-update  fetch script ──> transient file ──> interpreter ──> cleanup
//! ```
//!
//! All three run sequentially on a single thread while holding an advisory lock
//! next to the store root, so concurrent invocations fail fast instead of
//! corrupting the store.
//!
//! # Modules
//!
//! - [`installer`] - first-time setup of the store and global command
//! - [`updater`] - fast-forward-only synchronization
//! - [`upgrade`] - fetch-and-execute self-update
//! - [`publish`] - the global command symlink
//! - [`store`] - the on-disk payload store and its lock
//! - [`fetch`] - HTTPS retrieval of single resources
//! - [`git`] - git command wrapper
//! - [`process`] - subprocess execution with captured output
//! - [`config`] - global configuration file
//! - [`core`] - error types and rendering
//! - [`cli`] - command-line interface

// Lifecycle operations
pub mod installer;
pub mod updater;
pub mod upgrade;

// Filesystem and remote state
pub mod fetch;
pub mod git;
pub mod publish;
pub mod store;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod process;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
