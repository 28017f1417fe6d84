//! Required directory layout for projects and the canonical template.
//!
//! The layout itself is fixed data; checking it against disk lives in
//! `io::layout`. Both instances share the same shape and differ only in how
//! issues are labelled when reported.

/// Name of the nested directory holding list files.
pub const NESTED_DIR: &str = "arborist";

const REQUIRED_DIRS: &[&str] = &[NESTED_DIR, "docs", "experiments", "scripts"];
const REQUIRED_ROOT_FILES: &[&str] = &[".pre-commit-config.yaml", "AGENTS.md"];
const NESTED_FILES: &[&str] = &["backlog.md", "feedback.md", "tasks.md", "todo.md"];

/// Which layout is being checked; only affects how issues read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// The supervisor's own reference template. Issues are fatal.
    Template,
    /// A supervised project. Issues trigger a setup invocation.
    Project,
}

/// Immutable set of required entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSpec {
    pub kind: LayoutKind,
    pub required_dirs: &'static [&'static str],
    pub required_root_files: &'static [&'static str],
    /// Directory (relative to the checked root) the nested files live in.
    pub nested_dir: &'static str,
    /// Files required under `nested_dir` and forbidden at the root.
    pub nested_files: &'static [&'static str],
}

impl LayoutSpec {
    pub fn template() -> Self {
        Self::with_kind(LayoutKind::Template)
    }

    pub fn project() -> Self {
        Self::with_kind(LayoutKind::Project)
    }

    fn with_kind(kind: LayoutKind) -> Self {
        Self {
            kind,
            required_dirs: REQUIRED_DIRS,
            required_root_files: REQUIRED_ROOT_FILES,
            nested_dir: NESTED_DIR,
            nested_files: NESTED_FILES,
        }
    }
}

/// Layout problems found under one root, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutIssues {
    pub missing_dirs: Vec<String>,
    pub missing_root_files: Vec<String>,
    pub missing_nested_files: Vec<String>,
    /// Nested files that also exist directly at the root.
    pub misplaced_nested_files: Vec<String>,
}

impl LayoutIssues {
    pub fn has_issues(&self) -> bool {
        !(self.missing_dirs.is_empty()
            && self.missing_root_files.is_empty()
            && self.missing_nested_files.is_empty()
            && self.misplaced_nested_files.is_empty())
    }
}

/// Render issues as one line per non-empty category.
///
/// Diagnostic only: used in logs and the setup prompt, never parsed.
pub fn format_issues(spec: &LayoutSpec, issues: &LayoutIssues) -> String {
    let (scope, nested_label, root_label) = match spec.kind {
        LayoutKind::Template => ("template", "base template files", "templates root"),
        LayoutKind::Project => ("project", "project arborist files", "project root"),
    };

    let mut lines = Vec::new();
    if !issues.missing_dirs.is_empty() {
        lines.push(format!(
            "Missing {scope} directories: {}",
            issues.missing_dirs.join(", ")
        ));
    }
    if !issues.missing_root_files.is_empty() {
        lines.push(format!(
            "Missing {scope} root files: {}",
            issues.missing_root_files.join(", ")
        ));
    }
    if !issues.missing_nested_files.is_empty() {
        lines.push(format!(
            "Missing {nested_label}: {}",
            issues.missing_nested_files.join(", ")
        ));
    }
    if !issues.misplaced_nested_files.is_empty() {
        lines.push(format!(
            "{} found in {root_label}: {}",
            capitalize(nested_label),
            issues.misplaced_nested_files.join(", ")
        ));
    }
    lines.join("\n")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
