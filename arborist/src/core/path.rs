//! Lexical path helpers for keeping allow-list entries inside the fleet root.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` above the filesystem root is dropped, matching how absolute paths
/// resolve. Symlinks are not followed.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Join `entry` onto `root` and normalise the result.
///
/// An absolute `entry` replaces `root`, so it is judged on its own location.
pub fn resolve_under(root: &Path, entry: &str) -> PathBuf {
    normalize_lexically(&root.join(entry))
}

/// True if `candidate` lies strictly below `root` (the root itself does not count).
pub fn is_proper_descendant(root: &Path, candidate: &Path) -> bool {
    let root = normalize_lexically(root);
    let candidate = normalize_lexically(candidate);
    candidate != root && candidate.starts_with(&root)
}
