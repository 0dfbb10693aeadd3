//! Inner watch subscriptions for repository subpaths.
//!
//! The repo set decides *when* to subscribe; this trait is *how*. The
//! production backend is a `notify` watcher whose events all feed one channel.

use std::path::Path;

use notify::{RecursiveMode, Watcher};

use super::WatchError;

/// Registers and unregisters directories with a notification backend.
pub trait Subscriptions: Send {
    fn subscribe(&mut self, dir: &Path) -> Result<(), WatchError>;

    fn unsubscribe(&mut self, dir: &Path) -> Result<(), WatchError>;
}

/// Subscriptions backed by any `notify::Watcher`.
pub struct NotifySubscriptions<W> {
    watcher: W,
    mode: RecursiveMode,
}

impl<W: Watcher> NotifySubscriptions<W> {
    pub fn new(watcher: W, recursive: bool) -> Self {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        Self { watcher, mode }
    }
}

impl<W: Watcher + Send> Subscriptions for NotifySubscriptions<W> {
    fn subscribe(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, self.mode)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn unsubscribe(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .unwatch(dir)
            .map_err(|e| WatchError::PathUnwatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
