//! Watch command: run the watcher until interrupted.

use anyhow::Result;

use crate::config::Settings;
use crate::watcher::RepoWatcher;

/// Validate `settings`, then watch until Ctrl-C or a loop stops.
///
/// Startup failures (bad root, bad pattern, root subscription) are returned;
/// everything after that is logged.
pub async fn run(settings: &Settings) -> Result<()> {
    crate::log_event!("watcher", "starting repos watcher");

    let plan = settings.validate()?;
    let watcher = RepoWatcher::builder(plan).build()?;

    tokio::select! {
        res = watcher.run() => {
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            crate::log_event!("watcher", "interrupted, shutting down");
        }
    }
    Ok(())
}
