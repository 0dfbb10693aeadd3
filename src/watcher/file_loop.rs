//! Routes file events from watched subpaths to the action runner.

use std::path::Path;
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, WatcherKind};
use tokio::sync::mpsc;

use super::matcher;
use super::runner::ActionRunner;
use crate::config::WatchPlan;

/// Which file events count as "the file was written".
///
/// inotify reports one close-after-write per write, next to the create and
/// modify events for the same write. Backends without it fall back to
/// create and modify events, which may fire more than once per write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSignal {
    /// Close-after-write, plus files renamed into place.
    CloseWrite,
    /// Anything except reads and removals.
    Change,
}

impl WriteSignal {
    pub fn for_backend(kind: WatcherKind) -> Self {
        match kind {
            WatcherKind::Inotify => WriteSignal::CloseWrite,
            _ => WriteSignal::Change,
        }
    }

    pub fn triggers(&self, kind: &EventKind) -> bool {
        match self {
            WriteSignal::CloseWrite => matches!(
                kind,
                EventKind::Access(AccessKind::Close(AccessMode::Write))
                    | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both))
            ),
            // Reads and deletions never describe new content.
            WriteSignal::Change => {
                !matches!(kind, EventKind::Access(_) | EventKind::Remove(_))
            }
        }
    }
}

/// Sequential consumer of the shared inner notification channel.
///
/// A running command blocks the loop; the next event is read only after it
/// exits.
pub struct FileLoop {
    plan: Arc<WatchPlan>,
    runner: Arc<dyn ActionRunner>,
    signal: WriteSignal,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FileLoop {
    pub fn new(
        plan: Arc<WatchPlan>,
        runner: Arc<dyn ActionRunner>,
        signal: WriteSignal,
        events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    ) -> Self {
        Self {
            plan,
            runner,
            signal,
            events,
        }
    }

    /// Process events until the notification channel closes.
    pub async fn run(mut self) {
        while let Some(res) = self.events.recv().await {
            match res {
                Ok(event) => {
                    self.handle(&event).await;
                }
                Err(e) => tracing::error!("[files] watch error: {e}"),
            }
        }
        crate::debug_event!("files", "channel closed");
    }

    /// Handle one event, returning how many commands were run.
    pub async fn handle(&self, event: &Event) -> usize {
        if !self.signal.triggers(&event.kind) {
            return 0;
        }

        let mut executed = 0;
        for path in &event.paths {
            match matcher::resolve(path, &self.plan.repos_root, &self.plan.pattern) {
                Ok(repo) => {
                    self.execute(&repo).await;
                    executed += 1;
                }
                Err(skip) => {
                    crate::debug_event!("files", skip.as_str(), "{}", path.display());
                }
            }
        }
        executed
    }

    async fn execute(&self, repo: &Path) {
        crate::log_event!(
            "files",
            "executing",
            "\"{}\" in \"{}\"",
            self.plan.execute,
            repo.display()
        );

        match self.runner.run(repo, &self.plan.execute).await {
            Ok(output) => {
                let output = String::from_utf8_lossy(&output);
                let output = output.trim_end();
                if !output.is_empty() {
                    tracing::info!("{output}");
                }
            }
            Err(e) => tracing::error!("{e}"),
        }
    }
}
