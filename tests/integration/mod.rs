//! Integration test suite for scriptgrab
//!
//! End-to-end tests of the install, update and self-update lifecycle against
//! local git repositories standing in for the payload remote. No test touches
//! the network or paths outside its own temporary directory.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **install**: first-time install, refusal to reinstall, store locking
//! - **update**: fast-forward sync, idempotence, divergence
//! - **self_update**: fetch failures and transient file cleanup
//! - **cli**: the binary's output and exit codes

mod cli;
mod install;
mod self_update;
mod update;
