//! Maps a changed file back to the repository that owns it.
//!
//! A path qualifies when it currently exists as a regular file, its basename
//! matches the configured pattern, and it lies inside a repository directory
//! directly under the repos root.

use std::path::{Component, Path, PathBuf};

use regex::Regex;

/// Why a path did not resolve to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Path no longer exists (or cannot be stat'ed).
    Missing,
    /// Path is a directory or another non-file entry.
    NotFile,
    /// Basename does not match the pattern.
    PatternMismatch,
    /// Path is not inside a repository under the repos root.
    OutsideRoot,
}

impl Skip {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skip::Missing => "missing",
            Skip::NotFile => "not a file",
            Skip::PatternMismatch => "pattern mismatch",
            Skip::OutsideRoot => "outside repos root",
        }
    }
}

/// Resolve `path` to the root of the repository that owns it.
///
/// The basename check runs first so a non-matching path is rejected without
/// touching the filesystem.
pub fn resolve(path: &Path, repos_root: &Path, pattern: &Regex) -> Result<PathBuf, Skip> {
    let file_name = path.file_name().ok_or(Skip::NotFile)?;
    if !pattern.is_match(&file_name.to_string_lossy()) {
        return Err(Skip::PatternMismatch);
    }

    let metadata = std::fs::metadata(path).map_err(|_| Skip::Missing)?;
    if !metadata.is_file() {
        return Err(Skip::NotFile);
    }

    repository_of(path, repos_root).ok_or(Skip::OutsideRoot)
}

/// Compute the repository root for a file path without any filesystem access.
///
/// Returns `None` unless the file sits at least one directory below the root,
/// i.e. `<root>/<repo>/.../<file>`.
pub fn repository_of(path: &Path, repos_root: &Path) -> Option<PathBuf> {
    let path = clean_path(path);
    let root = clean_path(repos_root);

    let relative = path.strip_prefix(&root).ok()?;
    let mut components = relative.components();

    let repo = match components.next()? {
        Component::Normal(name) => name,
        _ => return None,
    };

    // The remainder must still contain the file itself.
    components.next()?;

    Some(root.join(repo))
}

/// Lexically normalize a path: drop `.` components, fold `..` into the
/// preceding segment and collapse repeated or trailing separators.
///
/// Works on paths that no longer exist, which matters for removal events.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(
                    cleaned.components().next_back(),
                    Some(Component::Normal(_))
                );
                if last_is_normal {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
