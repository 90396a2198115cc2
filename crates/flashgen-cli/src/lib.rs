//! `flashgen`: command-line front end for the exercise companion.
//!
//! Stands in for the desktop UI: every command goes through the same
//! blocking [`flashgen_runtime::CompanionService`] API the UI uses.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{companion_config, init_logging};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
