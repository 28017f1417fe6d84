//! Discover projects under a fleet root.
//!
//! Only the root and its immediate children are considered. Deeper nesting
//! is never scanned, so unrelated repositories inside a project are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::layout::NESTED_DIR;
use crate::io::paths::SEED_FILE;

/// Nested list files whose presence marks a project.
const NESTED_INDICATORS: &[&str] = &[
    "tasks.md",
    "todo.md",
    "feedback.md",
    "backlog.md",
    "user_requests.md",
];

/// Dependency-cache directories never treated as projects.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

/// True if `dir` carries the root marker or any nested list file.
pub fn has_project_indicators(dir: &Path) -> bool {
    if dir.join(SEED_FILE).is_file() {
        return true;
    }
    let nested = dir.join(NESTED_DIR);
    NESTED_INDICATORS
        .iter()
        .any(|name| nested.join(name).is_file())
}

fn is_candidate_name(name: &str) -> bool {
    !name.starts_with('.') && !SKIPPED_DIRS.contains(&name)
}

/// Return `root` (if it qualifies) followed by qualifying child directories.
///
/// Children come in the order the filesystem yields them; callers that need
/// a stable order must sort.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover_projects(root: &Path) -> Result<Vec<PathBuf>> {
    let mut projects = Vec::new();
    if has_project_indicators(root) {
        projects.push(root.to_path_buf());
    }

    let entries = fs::read_dir(root).with_context(|| format!("read dir {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir entry in {}", root.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("file type of {}", entry.path().display()))?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if !name.to_str().is_some_and(is_candidate_name) {
            continue;
        }
        let candidate = entry.path();
        if has_project_indicators(&candidate) {
            projects.push(candidate);
        }
    }

    debug!(count = projects.len(), "projects discovered");
    Ok(projects)
}
