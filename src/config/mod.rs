//! Configuration for scriptgrab.
//!
//! A single global TOML file describes where the payload comes from, where it is
//! stored, where the global command is published and how self-update behaves.
//! See [`global`] for the file format and lookup order.

mod global;

pub use global::{GitSettings, GlobalConfig, PublishSettings, SelfUpdateSettings};
