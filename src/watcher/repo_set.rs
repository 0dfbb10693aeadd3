//! Registry of repositories currently being watched.
//!
//! Membership and the inner subscriptions are kept in lockstep under a single
//! mutex: a repository is a member exactly when `<repo>/<watch_path>` is
//! subscribed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::matcher::clean_path;
use super::subscriptions::Subscriptions;

struct Inner<S> {
    members: BTreeSet<PathBuf>,
    subscriptions: S,
}

/// Concurrency-safe set of watched repository roots.
pub struct RepoSet<S> {
    repos_root: PathBuf,
    watch_path: PathBuf,
    inner: Mutex<Inner<S>>,
}

impl<S: Subscriptions> RepoSet<S> {
    /// Create an empty set for repositories directly under `repos_root`.
    pub fn new(repos_root: &Path, watch_path: &Path, subscriptions: S) -> Self {
        Self {
            repos_root: clean_path(repos_root),
            watch_path: watch_path.to_path_buf(),
            inner: Mutex::new(Inner {
                members: BTreeSet::new(),
                subscriptions,
            }),
        }
    }

    /// Directory watched inside a repository.
    pub fn target_of(&self, repo: &Path) -> PathBuf {
        clean_path(&repo.join(&self.watch_path))
    }

    /// Start watching `path` if it qualifies as a repository.
    ///
    /// Returns `true` only when the repository was newly added. Paths that are
    /// not directories directly under the root, lack the watch subpath, or are
    /// already members are left alone.
    pub fn try_add(&self, path: &Path) -> bool {
        let repo = clean_path(path);
        if repo.parent() != Some(self.repos_root.as_path()) {
            return false;
        }
        let target = self.target_of(&repo);

        let mut inner = self.inner.lock();
        if !repo.is_dir() || inner.members.contains(&repo) {
            return false;
        }
        if !target.is_dir() {
            crate::debug_event!("repos", "no watch path", "{}", repo.display());
            return false;
        }

        if let Err(e) = inner.subscriptions.subscribe(&target) {
            tracing::error!("[repos] failed to add {}: {e}", repo.display());
            return false;
        }

        crate::log_event!("repos", "adding repo", "{}", repo.display());
        inner.members.insert(repo);
        true
    }

    /// Stop watching `path`. Non-members are ignored.
    ///
    /// Returns `true` when the repository was a member.
    pub fn try_remove(&self, path: &Path) -> bool {
        let repo = clean_path(path);
        let target = self.target_of(&repo);

        let mut inner = self.inner.lock();
        if !inner.members.remove(&repo) {
            return false;
        }

        crate::log_event!("repos", "removing repo", "{}", repo.display());

        // The directory is usually gone already, in which case the backend
        // has dropped the watch on its own.
        if let Err(e) = inner.subscriptions.unsubscribe(&target) {
            crate::debug_event!("repos", "unwatch", "{e}");
        }
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().members.contains(&clean_path(path))
    }

    /// Snapshot of the current members, sorted.
    pub fn members(&self) -> Vec<PathBuf> {
        self.inner.lock().members.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::watcher::WatchError;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Records subscription calls instead of talking to the OS.
    #[derive(Default, Clone)]
    pub(crate) struct FakeSubscriptions {
        pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
        pub fail_subscribe: bool,
    }

    impl FakeSubscriptions {
        pub fn subscribed(&self) -> Vec<PathBuf> {
            let mut active = Vec::new();
            for (op, path) in self.calls.lock().iter() {
                if op == "subscribe" {
                    active.push(path.clone());
                } else {
                    active.retain(|p| p != path);
                }
            }
            active
        }
    }

    impl Subscriptions for FakeSubscriptions {
        fn subscribe(&mut self, dir: &Path) -> Result<(), WatchError> {
            if self.fail_subscribe {
                return Err(WatchError::PathWatchFailed {
                    path: dir.to_path_buf(),
                    reason: "denied".to_string(),
                });
            }
            self.calls
                .lock()
                .push(("subscribe".to_string(), dir.to_path_buf()));
            Ok(())
        }

        fn unsubscribe(&mut self, dir: &Path) -> Result<(), WatchError> {
            self.calls
                .lock()
                .push(("unsubscribe".to_string(), dir.to_path_buf()));
            Ok(())
        }
    }

    fn setup() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("alpha/src")).unwrap();
        fs::create_dir_all(root.join("bare")).unwrap();
        (temp, root)
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = RepoSet::new(&root, Path::new("src"), fake.clone());

        assert!(repos.try_add(&root.join("alpha")));
        assert!(!repos.try_add(&root.join("alpha")));

        assert_eq!(repos.members(), vec![clean_path(&root.join("alpha"))]);
        assert_eq!(fake.calls.lock().len(), 1);
        assert_eq!(fake.subscribed(), vec![clean_path(&root.join("alpha/src"))]);
    }

    #[test]
    fn test_add_canonicalizes_spelling() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = RepoSet::new(&root, Path::new("src"), fake.clone());

        assert!(repos.try_add(&root.join("alpha/")));
        assert!(!repos.try_add(&root.join("./alpha/../alpha")));
        assert!(repos.contains(&root.join("alpha")));
        assert_eq!(fake.calls.lock().len(), 1);
    }

    #[test]
    fn test_add_requires_watch_path() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = RepoSet::new(&root, Path::new("src"), fake.clone());

        assert!(!repos.try_add(&root.join("bare")));
        assert!(!repos.try_add(&root.join("missing")));
        assert!(repos.is_empty());
        assert!(fake.calls.lock().is_empty());
    }

    #[test]
    fn test_add_ignores_files_and_nested_dirs() {
        let (_temp, root) = setup();
        fs::write(root.join("file"), "x").unwrap();
        fs::create_dir_all(root.join("alpha/nested/src")).unwrap();
        let repos = RepoSet::new(&root, Path::new("src"), FakeSubscriptions::default());

        assert!(!repos.try_add(&root.join("file")));
        assert!(!repos.try_add(&root.join("alpha/nested")));
        assert!(repos.is_empty());
    }

    #[test]
    fn test_failed_subscription_is_not_a_member() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions {
            fail_subscribe: true,
            ..Default::default()
        };
        let repos = RepoSet::new(&root, Path::new("src"), fake);

        assert!(!repos.try_add(&root.join("alpha")));
        assert!(repos.is_empty());
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = RepoSet::new(&root, Path::new("src"), fake.clone());

        assert!(!repos.try_remove(&root.join("alpha")));
        assert!(!repos.try_remove(&root.join("never-existed")));
        assert!(fake.calls.lock().is_empty());
    }

    #[test]
    fn test_remove_after_directory_deleted() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = RepoSet::new(&root, Path::new("src"), fake.clone());

        repos.try_add(&root.join("alpha"));
        fs::remove_dir_all(root.join("alpha")).unwrap();

        assert!(repos.try_remove(&root.join("alpha")));
        assert!(!repos.try_remove(&root.join("alpha")));
        assert!(repos.is_empty());
        assert!(fake.subscribed().is_empty());
    }

    #[test]
    fn test_concurrent_adds_subscribe_once() {
        let (_temp, root) = setup();
        let fake = FakeSubscriptions::default();
        let repos = Arc::new(RepoSet::new(&root, Path::new("src"), fake.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repos = repos.clone();
                let path = root.join("alpha");
                std::thread::spawn(move || repos.try_add(&path))
            })
            .collect();

        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        assert_eq!(added, 1);
        assert_eq!(fake.calls.lock().len(), 1);
    }
}
