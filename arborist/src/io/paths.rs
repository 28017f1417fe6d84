//! Canonical file locations for projects and the supervisor home.

use std::path::{Path, PathBuf};

use crate::core::layout::NESTED_DIR;

/// Root-level marker that identifies a project even before its lists exist.
pub const SEED_FILE: &str = "SEED.md";
/// Project-specific onboarding instructions for the agent.
pub const ONBOARDING_FILE: &str = "AGENTS.md";
/// Allow-list of project paths, at the fleet root.
pub const ACTIVE_PROJECTS_FILE: &str = "active_projects.txt";
/// Optional supervisor configuration, in the supervisor home.
pub const CONFIG_FILE: &str = "arborist.toml";

/// All list and instruction paths for one project directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub tasks_path: PathBuf,
    pub todo_path: PathBuf,
    pub feedback_path: PathBuf,
    /// Optional operator requests; never checked for work, only reset.
    pub user_requests_path: PathBuf,
    pub onboarding_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let lists_dir = root.join(NESTED_DIR);
        Self {
            tasks_path: lists_dir.join("tasks.md"),
            todo_path: lists_dir.join("todo.md"),
            feedback_path: lists_dir.join("feedback.md"),
            user_requests_path: lists_dir.join("user_requests.md"),
            onboarding_path: root.join(ONBOARDING_FILE),
            root,
        }
    }

    /// Lists that must exist for the task loop to run.
    pub fn required_lists(&self) -> [&Path; 2] {
        [&self.tasks_path, &self.todo_path]
    }

    /// Every list reset after a clean exhaustion.
    pub fn cleared_lists(&self) -> [&Path; 4] {
        [
            &self.tasks_path,
            &self.todo_path,
            &self.feedback_path,
            &self.user_requests_path,
        ]
    }
}

/// Locations inside the supervisor's own home directory.
#[derive(Debug, Clone)]
pub struct SupervisorPaths {
    pub home: PathBuf,
    pub templates_dir: PathBuf,
    pub project_setup_path: PathBuf,
    pub complete_next_item_path: PathBuf,
    pub config_path: PathBuf,
}

impl SupervisorPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            templates_dir: home.join("templates"),
            project_setup_path: home.join("project_setup.md"),
            complete_next_item_path: home.join("complete_next_item.md"),
            config_path: home.join(CONFIG_FILE),
            home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_lists_live_under_nested_dir() {
        let paths = ProjectPaths::new("/fleet/p");
        assert_eq!(paths.tasks_path, PathBuf::from("/fleet/p/arborist/tasks.md"));
        assert_eq!(paths.todo_path, PathBuf::from("/fleet/p/arborist/todo.md"));
        assert_eq!(
            paths.feedback_path,
            PathBuf::from("/fleet/p/arborist/feedback.md")
        );
        assert_eq!(
            paths.user_requests_path,
            PathBuf::from("/fleet/p/arborist/user_requests.md")
        );
        assert_eq!(paths.onboarding_path, PathBuf::from("/fleet/p/AGENTS.md"));
    }
}
