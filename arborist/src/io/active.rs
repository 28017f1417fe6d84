//! Allow-list resolution from `active_projects.txt`.
//!
//! When the allow-list names at least one entry it replaces discovery for the
//! cycle. Entries that leave the fleet root are always rejected.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::lists::COMMENT_MARKER;
use crate::core::path::{is_proper_descendant, resolve_under};

/// Why an allow-list entry was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    OutsideRoot,
    NotFound,
    NotADirectory,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MissingReason::OutsideRoot => "outside the workspace root",
            MissingReason::NotFound => "folder not found",
            MissingReason::NotADirectory => "not a folder",
        };
        f.write_str(text)
    }
}

/// An allow-list entry that could not be resolved to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEntry {
    /// Entry text as written (trimmed).
    pub entry: String,
    pub reason: MissingReason,
}

/// Result of reading the allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveProjects {
    /// `None` when the file is absent or names no entries: fall back to discovery.
    pub projects: Option<Vec<PathBuf>>,
    pub missing: Vec<MissingEntry>,
}

/// Parse allow-list text into unique entries, in file order.
pub fn parse_entries(contents: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .filter(|line| seen.insert(*line))
        .collect()
}

/// Resolve the allow-list at `config_path` against `root`.
pub fn resolve_active_projects(root: &Path, config_path: &Path) -> Result<ActiveProjects> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ActiveProjects::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("read {}", config_path.display()));
        }
    };

    let entries = parse_entries(&contents);
    if entries.is_empty() {
        return Ok(ActiveProjects::default());
    }

    let root = std::path::absolute(root)
        .with_context(|| format!("resolve root {}", root.display()))?;
    let mut projects = Vec::new();
    let mut missing = Vec::new();
    for entry in entries {
        match resolve_entry(&root, entry) {
            Ok(path) => projects.push(path),
            Err(reason) => {
                debug!(entry, %reason, "allow-list entry rejected");
                missing.push(MissingEntry {
                    entry: entry.to_string(),
                    reason,
                });
            }
        }
    }

    Ok(ActiveProjects {
        projects: Some(projects),
        missing,
    })
}

fn resolve_entry(root: &Path, entry: &str) -> std::result::Result<PathBuf, MissingReason> {
    let resolved = resolve_under(root, entry);
    if !is_proper_descendant(root, &resolved) {
        return Err(MissingReason::OutsideRoot);
    }
    match fs::metadata(&resolved) {
        Err(_) => Err(MissingReason::NotFound),
        Ok(meta) if !meta.is_dir() => Err(MissingReason::NotADirectory),
        Ok(_) => Ok(resolved),
    }
}
