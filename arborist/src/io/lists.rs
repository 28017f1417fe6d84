//! Destructive reset of list files back to their header line.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::lists::header_only;

/// Truncate a list file to its header line.
///
/// A missing file is a no-op. Resetting an already reset file leaves it
/// unchanged.
pub fn reset_list(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "list file missing, nothing to reset");
            return Ok(());
        }
        Err(err) => return Err(err).with_context(|| format!("read list {}", path.display())),
    };
    let updated = header_only(&contents);
    if updated == contents {
        return Ok(());
    }
    fs::write(path, updated).with_context(|| format!("reset list {}", path.display()))?;
    debug!(path = %path.display(), "list file reset");
    Ok(())
}

/// Reset each path in order, stopping at the first I/O error.
pub fn reset_lists<'a, I>(paths: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Path>,
{
    for path in paths {
        reset_list(path)?;
    }
    Ok(())
}

/// Read a list file, treating a missing file as empty.
pub fn read_list_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("read list {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).expect("write list");
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).expect("read list")
    }

    #[test]
    fn reset_preserves_header_and_clears_the_rest() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "todo.md", "# Header\n\n1. Do work\n");

        reset_list(&temp.path().join("todo.md")).expect("reset");
        assert_eq!(read(temp.path(), "todo.md"), "# Header\n");

        reset_list(&temp.path().join("todo.md")).expect("reset again");
        assert_eq!(read(temp.path(), "todo.md"), "# Header\n");
    }

    #[test]
    fn reset_is_a_no_op_for_missing_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing.md");
        reset_list(&missing).expect("reset missing");
        assert!(!missing.exists());
    }

    #[test]
    fn reset_with_empty_header_empties_the_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        write(temp.path(), "tasks.md", "\n1. Item without header\n");

        reset_list(&temp.path().join("tasks.md")).expect("reset");
        assert_eq!(read(temp.path(), "tasks.md"), "");
    }

    #[test]
    fn reset_lists_handles_a_mixed_batch() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path();
        write(dir, "tasks.md", "# Tasks\n\n1. Task\n");
        write(dir, "todo.md", "# Todo\n\n1. Item\n");
        write(dir, "feedback.md", "# Feedback\n\n- Note\n");

        let paths = [
            dir.join("tasks.md"),
            dir.join("todo.md"),
            dir.join("feedback.md"),
            dir.join("missing.md"),
        ];
        reset_lists(paths.iter().map(|path| path.as_path())).expect("reset batch");

        assert_eq!(read(dir, "tasks.md"), "# Tasks\n");
        assert_eq!(read(dir, "todo.md"), "# Todo\n");
        assert_eq!(read(dir, "feedback.md"), "# Feedback\n");
    }

    #[test]
    fn reset_lists_propagates_read_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path();
        // A directory where a file is expected cannot be read as a list.
        fs::create_dir(dir.join("tasks.md")).expect("mkdir");
        write(dir, "todo.md", "# Todo\n\n1. Item\n");

        let paths = [dir.join("tasks.md"), dir.join("todo.md")];
        let err = reset_lists(paths.iter().map(|path| path.as_path())).unwrap_err();
        assert!(err.to_string().contains("read list"));
        assert_eq!(read(dir, "todo.md"), "# Todo\n\n1. Item\n");
    }

    #[test]
    fn read_missing_list_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let contents = read_list_or_empty(&temp.path().join("feedback.md")).expect("read");
        assert_eq!(contents, "");
    }
}
