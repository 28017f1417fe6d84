//! Prompt rendering for setup and task invocations.
//!
//! Prompts point the agent at files; they never embed list contents.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::layout::{LayoutIssues, LayoutSpec, format_issues};
use crate::io::paths::{ProjectPaths, SupervisorPaths};

const SETUP_TEMPLATE: &str = include_str!("prompts/setup.md");
const TASK_TEMPLATE: &str = include_str!("prompts/task.md");

/// Inputs for a task prompt.
#[derive(Debug, Clone, Copy)]
pub struct TaskPromptInputs<'a> {
    pub project: &'a ProjectPaths,
    pub supervisor: &'a SupervisorPaths,
    /// Ask the agent to read the onboarding file first.
    pub first_task: bool,
    pub time_remaining: Duration,
}

/// Template engine wrapper around minijinja.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("setup", SETUP_TEMPLATE)
            .context("load setup prompt template")?;
        env.add_template("task", TASK_TEMPLATE)
            .context("load task prompt template")?;
        Ok(Self { env })
    }

    /// Prompt sent once when a project's layout has issues.
    pub fn render_setup(
        &self,
        project: &ProjectPaths,
        supervisor: &SupervisorPaths,
        issues: &LayoutIssues,
    ) -> Result<String> {
        let template = self.env.get_template("setup")?;
        let rendered = template
            .render(context! {
                project_root => display(&project.root),
                issues => format_issues(&LayoutSpec::project(), issues),
                setup_path => display(&supervisor.project_setup_path),
                onboarding_path => display(&project.onboarding_path),
            })
            .context("render setup prompt")?;
        Ok(rendered)
    }

    /// Prompt for one task iteration.
    pub fn render_task(&self, input: &TaskPromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("task")?;
        let rendered = template
            .render(context! {
                todo_path => display(&input.project.todo_path),
                first_task => input.first_task,
                onboarding_path => display(&input.project.onboarding_path),
                instructions_path => display(&input.supervisor.complete_next_item_path),
                project_root => display(&input.project.root),
                time_remaining_secs => input.time_remaining.as_secs(),
            })
            .context("render task prompt")?;
        Ok(rendered)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
