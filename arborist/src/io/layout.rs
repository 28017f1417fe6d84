//! Check a directory against a [`LayoutSpec`].

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::layout::{LayoutIssues, LayoutSpec};

/// Validate `root` against `spec`.
///
/// Unreadable or missing entries are reported as missing; this never fails.
pub fn validate_layout(root: &Path, spec: &LayoutSpec) -> LayoutIssues {
    let mut issues = LayoutIssues::default();

    for name in spec.required_dirs {
        if !is_dir(&root.join(name)) {
            issues.missing_dirs.push(name.to_string());
        }
    }

    for name in spec.required_root_files {
        if !is_file(&root.join(name)) {
            issues.missing_root_files.push(name.to_string());
        }
    }

    let nested_dir = root.join(spec.nested_dir);
    for name in spec.nested_files {
        if !is_file(&nested_dir.join(name)) {
            issues.missing_nested_files.push(name.to_string());
        }
        if is_file(&root.join(name)) {
            issues.misplaced_nested_files.push(name.to_string());
        }
    }

    debug!(root = %root.display(), has_issues = issues.has_issues(), "layout checked");
    issues
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_dir())
}

fn is_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_complete_layout;

    #[test]
    fn complete_layout_has_no_issues() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_complete_layout(temp.path()).expect("layout");

        let issues = validate_layout(temp.path(), &LayoutSpec::project());
        assert_eq!(issues, LayoutIssues::default());
    }

    #[test]
    fn empty_directory_reports_every_category_but_misplaced() {
        let temp = tempfile::tempdir().expect("tempdir");

        let issues = validate_layout(temp.path(), &LayoutSpec::template());
        assert_eq!(
            issues.missing_dirs,
            vec!["arborist", "docs", "experiments", "scripts"]
        );
        assert_eq!(issues.missing_root_files, vec![".pre-commit-config.yaml", "AGENTS.md"]);
        assert_eq!(
            issues.missing_nested_files,
            vec!["backlog.md", "feedback.md", "tasks.md", "todo.md"]
        );
        assert!(issues.misplaced_nested_files.is_empty());
    }

    #[test]
    fn flags_misplaced_file_even_when_nested_copy_exists() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_complete_layout(temp.path()).expect("layout");
        fs::write(temp.path().join("todo.md"), "# Todo\n").expect("write stray");
        fs::remove_file(temp.path().join("arborist/backlog.md")).expect("remove");

        let issues = validate_layout(temp.path(), &LayoutSpec::project());
        assert_eq!(issues.missing_nested_files, vec!["backlog.md"]);
        assert_eq!(issues.misplaced_nested_files, vec!["todo.md"]);
        assert!(issues.has_issues());
    }

    #[test]
    fn wrong_entry_kinds_count_as_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_complete_layout(temp.path()).expect("layout");
        fs::remove_dir_all(temp.path().join("docs")).expect("remove docs");
        fs::write(temp.path().join("docs"), "not a dir").expect("write docs file");
        fs::remove_file(temp.path().join("AGENTS.md")).expect("remove agents");
        fs::create_dir(temp.path().join("AGENTS.md")).expect("mkdir agents");

        let issues = validate_layout(temp.path(), &LayoutSpec::project());
        assert_eq!(issues.missing_dirs, vec!["docs"]);
        assert_eq!(issues.missing_root_files, vec!["AGENTS.md"]);
    }
}
