//! Core types shared by every lifecycle operation.
//!
//! - [`error`] - the [`ScriptGrabError`] taxonomy, operator-facing rendering and exit codes

pub mod error;

pub use error::{
    EXIT_FAILURE, EXIT_INTERRUPTED, ErrorContext, FetchError, ScriptGrabError, exit_code,
    user_friendly_error,
};
