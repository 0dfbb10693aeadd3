//! Supervisor that owns both notification watchers and runs the two loops.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatchError;
use super::file_loop::{FileLoop, WriteSignal};
use super::repo_set::RepoSet;
use super::root_loop::RootLoop;
use super::runner::{ActionRunner, ShellRunner};
use super::subscriptions::NotifySubscriptions;
use crate::config::WatchPlan;

/// Repo set driven by the platform's notification backend.
pub type NotifyRepoSet = RepoSet<NotifySubscriptions<RecommendedWatcher>>;

/// Watches the repos root and every qualifying repository's subpath.
///
/// ```text
/// root watcher --> RootLoop --> RepoSet (try_add / try_remove)
///                                  |
///                            inner watcher --> FileLoop --> ActionRunner
/// ```
pub struct RepoWatcher {
    plan: Arc<WatchPlan>,
    runner: Arc<dyn ActionRunner>,
    repos: Arc<NotifyRepoSet>,
    root_watcher: RecommendedWatcher,
    root_rx: mpsc::Receiver<notify::Result<Event>>,
    file_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl RepoWatcher {
    pub fn builder(plan: WatchPlan) -> RepoWatcherBuilder {
        RepoWatcherBuilder::new(plan)
    }

    /// Repositories currently being watched.
    pub fn repos(&self) -> Arc<NotifyRepoSet> {
        self.repos.clone()
    }

    /// Subscribe to the repos root and populate the repo set from a listing.
    ///
    /// The root subscription is registered before the listing so that a
    /// repository created in between is reported by an event; the duplicate
    /// add that may follow is a no-op.
    pub fn start(&mut self) -> Result<(), WatchError> {
        let root = &self.plan.repos_root;
        if !root.exists() {
            return Err(WatchError::RootMissing { path: root.clone() });
        }
        if !root.is_dir() {
            return Err(WatchError::RootNotDirectory { path: root.clone() });
        }

        self.root_watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;

        let added = populate(&self.repos, root);
        crate::log_event!(
            "watcher",
            "monitoring",
            "{added} repos under {}",
            root.display()
        );
        Ok(())
    }

    /// Run both loops until either notification channel closes.
    pub async fn run(mut self) -> Result<(), WatchError> {
        self.start()?;

        let root_loop = RootLoop::new(self.repos.clone(), self.root_rx);
        let file_loop = FileLoop::new(
            self.plan.clone(),
            self.runner.clone(),
            WriteSignal::for_backend(RecommendedWatcher::kind()),
            self.file_rx,
        );

        let mut root_task = tokio::spawn(root_loop.run());
        let mut file_task = tokio::spawn(file_loop.run());

        crate::log_event!("watcher", "started");

        // Keeps the root subscription alive for as long as the loops run.
        let _root_watcher = self.root_watcher;

        let finished = tokio::select! {
            res = &mut root_task => { file_task.abort(); res }
            res = &mut file_task => { root_task.abort(); res }
        };

        if let Err(e) = finished {
            if e.is_panic() {
                tracing::error!("[watcher] loop panicked: {e}");
            }
        }
        Err(WatchError::ChannelClosed)
    }
}

/// Offer every entry of `root` to the repo set, returning how many were added.
pub fn populate<S: super::Subscriptions>(repos: &RepoSet<S>, root: &Path) -> usize {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("[watcher] failed to list {}: {e}", root.display());
            return 0;
        }
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| repos.try_add(path))
        .count()
}

/// Builder for constructing a RepoWatcher.
pub struct RepoWatcherBuilder {
    plan: WatchPlan,
    runner: Option<Arc<dyn ActionRunner>>,
    channel_capacity: usize,
}

impl RepoWatcherBuilder {
    pub fn new(plan: WatchPlan) -> Self {
        Self {
            plan,
            runner: None,
            channel_capacity: 100,
        }
    }

    /// Replace the shell runner, e.g. with a recording one in tests.
    pub fn runner(mut self, runner: Arc<dyn ActionRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Capacity of the repos-root notification channel.
    ///
    /// The inner channel is unbounded: its backend thread also answers the
    /// subscribe calls made under the repo set lock, so it must never wait on
    /// a busy file loop.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Build the watcher. Nothing is subscribed until `start` or `run`.
    pub fn build(self) -> Result<RepoWatcher, WatchError> {
        let (root_tx, root_rx) = mpsc::channel(self.channel_capacity);
        let (file_tx, file_rx) = mpsc::unbounded_channel();

        let root_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = root_tx.blocking_send(res);
        })?;
        let file_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = file_tx.send(res);
        })?;

        let plan = Arc::new(self.plan);
        let subscriptions = NotifySubscriptions::new(file_watcher, plan.recursive);
        let repos = Arc::new(RepoSet::new(
            &plan.repos_root,
            &plan.watch_path,
            subscriptions,
        ));

        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(ShellRunner::new(plan.shell.clone())));

        Ok(RepoWatcher {
            plan,
            runner,
            repos,
            root_watcher,
            root_rx,
            file_rx,
        })
    }
}

/// Paths of the repositories that qualify right now, without watching.
pub fn qualifying_repos(plan: &WatchPlan) -> Result<Vec<PathBuf>, WatchError> {
    let root = &plan.repos_root;
    if !root.is_dir() {
        return Err(WatchError::RootNotDirectory { path: root.clone() });
    }

    let entries = std::fs::read_dir(root).map_err(|e| WatchError::PathWatchFailed {
        path: root.clone(),
        reason: e.to_string(),
    })?;

    let mut repos: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join(&plan.watch_path).is_dir())
        .collect();
    repos.sort();
    Ok(repos)
}
