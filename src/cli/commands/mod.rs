//! Command implementations for the CLI.

pub mod check;
pub mod init;
pub mod watch;
