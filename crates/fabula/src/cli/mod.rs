//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the fabula binary.

mod commands;
mod run;

pub use commands::Cli;
pub use run::run_command;
