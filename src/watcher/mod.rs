//! Two-tier repository watcher.
//!
//! The outer tier watches the repos root and keeps the set of watched
//! repositories in sync with what exists on disk. The inner tier watches each
//! repository's subpath and runs the configured command when a matching file
//! changes.
//!
//! # Architecture
//!
//! ```text
//! RepoWatcher
//!   - root notify watcher -> RootLoop -> RepoSet
//!   - inner notify watcher (owned by RepoSet) -> FileLoop -> ActionRunner
//! ```

mod error;
mod file_loop;
pub mod matcher;
mod repo_set;
mod root_loop;
mod runner;
mod subscriptions;
mod supervisor;

pub use error::{RunError, WatchError};
pub use file_loop::{FileLoop, WriteSignal};
pub use matcher::{Skip, resolve};
pub use repo_set::RepoSet;
pub use root_loop::{RootAction, RootLoop};
pub use runner::{ActionRunner, ShellRunner};
pub use subscriptions::{NotifySubscriptions, Subscriptions};
pub use supervisor::{NotifyRepoSet, RepoWatcher, RepoWatcherBuilder, populate, qualifying_repos};
