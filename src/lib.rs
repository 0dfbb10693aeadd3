//! Watch a directory of repositories and run a command inside a repository
//! whenever a matching file in its watched subpath changes.

pub mod cli;
pub mod config;
pub mod logging;
pub mod watcher;

pub use config::{ConfigError, LoggingConfig, Settings, WatchPlan};
pub use watcher::{ActionRunner, RepoSet, RepoWatcher, RunError, ShellRunner, WatchError};
