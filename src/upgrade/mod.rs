//! Self-update by fetching and executing a remote script.
//!
//! Unlike [`crate::updater`], which synchronizes the payload tree with git,
//! self-update retrieves a single script body over HTTPS and runs it with a
//! configured interpreter (by default `python3`). This is remote code execution
//! without a sandbox, so it is gated:
//!
//! - the caller must pass `--trust-remote-code`, or the configuration must set
//!   `self_update.trusted = true`; otherwise [`ScriptGrabError::SelfUpdateNotTrusted`]
//! - a warning is printed on every run
//! - if `self_update.sha256` is set, the body is verified before anything runs
//!
//! ```text
//! fetch ──> verify (optional) ──> transient file ──> interpreter <file> ──> cleanup
//! ```
//!
//! [`ScriptGrabError::SelfUpdateNotTrusted`]: crate::core::ScriptGrabError::SelfUpdateNotTrusted

pub mod self_updater;
pub mod verification;

pub use self_updater::SelfUpdater;
pub use verification::ChecksumVerifier;
