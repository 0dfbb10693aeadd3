//! Command-line interface for the repository watcher.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
