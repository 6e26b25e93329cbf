//! Coverdeck CLI - library side of the `coverdeck` binary
//!
//! Configuration loading, error types and the `inspect` report are kept here
//! so they can be tested without spawning the binary.

pub mod config;
pub mod error;
pub mod inspect;

pub use config::Settings;
pub use error::{CliError, Result};
