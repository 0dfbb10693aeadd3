//! Reconciles the repo set against events on the repos root.

use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tokio::sync::mpsc;

use super::repo_set::RepoSet;
use super::subscriptions::Subscriptions;

/// What a root-level event means for the repo set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootAction {
    Add,
    Remove,
    /// Rename whose direction the backend does not report.
    Refresh,
    Ignore,
}

impl RootAction {
    /// Classify a root-level event kind.
    ///
    /// Creation and attribute changes may turn a directory into a repository;
    /// removal and renaming-away take it out. A rename *into* the root is a
    /// creation from our point of view. FSEvents reports both halves of a
    /// rename as `RenameMode::Any`, so those are re-checked on disk.
    pub fn of(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => RootAction::Add,
            EventKind::Modify(ModifyKind::Metadata(_)) => RootAction::Add,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => RootAction::Add,
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => RootAction::Refresh,
            EventKind::Modify(ModifyKind::Name(_)) => RootAction::Remove,
            EventKind::Remove(_) => RootAction::Remove,
            _ => RootAction::Ignore,
        }
    }
}

/// Sequential consumer of repos-root events. Sole writer to the repo set.
pub struct RootLoop<S> {
    repos: Arc<RepoSet<S>>,
    events: mpsc::Receiver<notify::Result<Event>>,
}

impl<S: Subscriptions> RootLoop<S> {
    pub fn new(repos: Arc<RepoSet<S>>, events: mpsc::Receiver<notify::Result<Event>>) -> Self {
        Self { repos, events }
    }

    /// Process events until the notification channel closes.
    pub async fn run(mut self) {
        while let Some(res) = self.events.recv().await {
            match res {
                Ok(event) => self.handle(&event),
                Err(e) => tracing::error!("[root] watch error: {e}"),
            }
        }
        crate::debug_event!("root", "channel closed");
    }

    /// Apply one event to the repo set.
    pub fn handle(&self, event: &Event) {
        // A paired rename carries both the old and the new name.
        if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
            if let [from, to] = event.paths.as_slice() {
                self.repos.try_remove(from);
                self.repos.try_add(to);
                return;
            }
        }

        let action = RootAction::of(&event.kind);
        for path in &event.paths {
            match action {
                RootAction::Add => {
                    self.repos.try_add(path);
                }
                RootAction::Remove => {
                    self.repos.try_remove(path);
                }
                RootAction::Refresh => {
                    self.repos.try_remove(path);
                    self.repos.try_add(path);
                }
                RootAction::Ignore => {
                    crate::debug_event!("root", "ignored", "{:?} {}", event.kind, path.display());
                }
            }
        }
    }
}
