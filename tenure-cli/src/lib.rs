//! Library half of the `tenure` binary: argument parsing, logging setup and commands.

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Commands};
