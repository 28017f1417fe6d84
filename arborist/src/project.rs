//! Per-project task loop.
//!
//! Validates the project layout (running a one-shot setup invocation when it
//! is incomplete), then invokes the agent once per task until the lists are
//! exhausted, the time budget runs out, or required lists go missing. A clean
//! exhaustion resets the lists to their headers; a run that saw a timeout
//! leaves them untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::core::budget::remaining_budget;
use crate::core::layout::{LayoutSpec, format_issues};
use crate::core::lists::has_work_items;
use crate::core::types::{LoopStop, ProjectOutcome, ResetAction, reset_action};
use crate::io::agent::{Agent, AgentError};
use crate::io::config::SupervisorConfig;
use crate::io::layout::validate_layout;
use crate::io::lists::{read_list_or_empty, reset_lists};
use crate::io::paths::{ProjectPaths, SupervisorPaths};
use crate::io::prompt::{PromptRenderer, TaskPromptInputs};

/// Settings shared by every project run in a fleet.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub supervisor: SupervisorPaths,
    /// Wall-clock budget for one project's task loop.
    pub budget: Duration,
    /// Timeout applied to each task invocation.
    pub task_timeout: Duration,
}

impl ProjectConfig {
    pub fn from_supervisor(supervisor: SupervisorPaths, cfg: &SupervisorConfig) -> Self {
        Self {
            supervisor,
            budget: cfg.project_budget(),
            task_timeout: cfg.task_timeout(),
        }
    }
}

/// Transient state for one run, discarded when the loop exits.
#[derive(Debug)]
struct RunState {
    deadline: Instant,
    is_first_task: bool,
    saw_timeout: bool,
    tasks_run: u32,
    timeouts: u32,
}

impl RunState {
    fn new(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
            is_first_task: true,
            saw_timeout: false,
            tasks_run: 0,
            timeouts: 0,
        }
    }
}

/// Run the task loop for one project.
///
/// Agent failures other than timeouts propagate and abort this project's run.
/// A failed setup invocation is logged and the loop proceeds, unless the agent
/// executable is missing altogether.
#[instrument(skip_all, fields(project = %project_dir.display()))]
pub fn run_project<A: Agent>(
    project_dir: &Path,
    agent: &A,
    config: &ProjectConfig,
) -> Result<ProjectOutcome> {
    let mut state = RunState::new(config.budget);

    if !project_dir.is_dir() {
        error!("project folder not found");
        return Ok(ProjectOutcome {
            stop: LoopStop::ProjectMissing,
            ran_setup: false,
            tasks_run: 0,
            timeouts: 0,
            reset: ResetAction::NotApplicable,
        });
    }

    let paths = ProjectPaths::new(project_dir);
    let prompts = PromptRenderer::new()?;
    let ran_setup = run_setup_if_needed(&paths, agent, config, &prompts)?;

    let stop = loop {
        let Some(time_remaining) = remaining_budget(state.deadline) else {
            info!("time budget reached; stopping before starting a new task");
            break LoopStop::DeadlineReached;
        };

        if let Some(missing) = first_missing_list(&paths) {
            warn!(list = %missing.display(), "required list file is still missing; stopping");
            break LoopStop::LayoutMissing;
        }

        if !any_work_remaining(&paths)? {
            info!("task lists have no remaining items; stopping");
            break LoopStop::Exhausted;
        }

        let prompt = prompts.render_task(&TaskPromptInputs {
            project: &paths,
            supervisor: &config.supervisor,
            first_task: state.is_first_task,
            time_remaining,
        })?;
        state.tasks_run += 1;
        info!(task = state.tasks_run, first_task = state.is_first_task, "invoking agent for next item");

        let outcome = agent
            .invoke_with_timeout(&prompt, config.task_timeout)
            .with_context(|| format!("task {} in {}", state.tasks_run, project_dir.display()))?;
        if outcome.timed_out {
            state.saw_timeout = true;
            state.timeouts += 1;
            warn!(task = state.tasks_run, "task timed out; re-evaluating lists");
        } else {
            state.is_first_task = false;
        }
    };

    let reset = reset_action(stop, state.saw_timeout);
    match reset {
        ResetAction::Applied => {
            reset_lists(paths.cleared_lists())?;
            info!("list files reset to their headers");
        }
        ResetAction::SkippedAfterTimeout => {
            info!("skipping list reset because a task timed out in this run");
        }
        ResetAction::NotApplicable => {}
    }

    info!(
        stop = stop.as_str(),
        tasks_run = state.tasks_run,
        timeouts = state.timeouts,
        "project run finished"
    );
    Ok(ProjectOutcome {
        stop,
        ran_setup,
        tasks_run: state.tasks_run,
        timeouts: state.timeouts,
        reset,
    })
}

/// Run one untimed setup invocation if the layout has issues.
///
/// Returns whether setup ran.
fn run_setup_if_needed<A: Agent>(
    paths: &ProjectPaths,
    agent: &A,
    config: &ProjectConfig,
    prompts: &PromptRenderer,
) -> Result<bool> {
    let spec = LayoutSpec::project();
    let issues = validate_layout(&paths.root, &spec);
    if !issues.has_issues() {
        return Ok(false);
    }

    warn!(
        issues = %format_issues(&spec, &issues),
        "project layout is incomplete; running setup"
    );
    let prompt = prompts.render_setup(paths, &config.supervisor, &issues)?;
    if let Err(err) = agent.invoke(&prompt) {
        if AgentError::is_not_found(&err) {
            return Err(err);
        }
        warn!(err = %format!("{err:#}"), "setup invocation failed; continuing");
    }
    Ok(true)
}

fn first_missing_list(paths: &ProjectPaths) -> Option<PathBuf> {
    paths
        .required_lists()
        .into_iter()
        .find(|path| !path.is_file())
        .map(Path::to_path_buf)
}

/// Re-read every list from disk; the agent's edits are the only source of truth.
fn any_work_remaining(paths: &ProjectPaths) -> Result<bool> {
    let mut any_work = false;
    for path in paths.required_lists() {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read list {}", path.display()))?;
        any_work |= has_work_items(&contents);
    }
    any_work |= has_work_items(&read_list_or_empty(&paths.feedback_path)?);
    Ok(any_work)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedAgent, ScriptedInvocation, TestFleet};

    const TODO_WITH_ITEM: &str = "# Todo\n\n1. Write the parser\n";
    const TASKS_WITH_ITEM: &str = "# Tasks\n\n- parser\n";

    #[test]
    fn missing_project_is_reported_without_invoking_agent() {
        let fleet = TestFleet::new().expect("fleet");
        let agent = ScriptedAgent::new(Vec::new());

        let outcome =
            run_project(&fleet.root().join("ghost"), &agent, &fleet.project_config()).expect("run");
        assert_eq!(outcome.stop, LoopStop::ProjectMissing);
        assert!(agent.calls().is_empty());
    }

    #[test]
    fn exhausted_project_without_timeouts_resets_lists() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.todo_path, TODO_WITH_ITEM);
        fleet.write(&project.feedback_path, "# Feedback\n\n   \n");

        let agent = ScriptedAgent::new(vec![
            ScriptedInvocation::completed().with_write(&project.todo_path, "# Todo\n\n\n"),
        ]);

        let outcome = run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        assert_eq!(outcome.stop, LoopStop::Exhausted);
        assert_eq!(outcome.reset, ResetAction::Applied);
        assert_eq!(outcome.tasks_run, 1);
        assert!(!outcome.ran_setup);
        assert_eq!(fleet.read(&project.todo_path), "# Todo\n");
        assert_eq!(fleet.read(&project.feedback_path), "# Feedback\n");
        agent.assert_drained().expect("drained");
    }

    #[test]
    fn user_requests_are_reset_but_never_count_as_work() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.user_requests_path, "# Requests\n\n- Add dark mode\n");

        let agent = ScriptedAgent::new(Vec::new());

        let outcome = run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        assert_eq!(outcome.stop, LoopStop::Exhausted);
        assert_eq!(outcome.reset, ResetAction::Applied);
        assert!(agent.calls().is_empty());
        assert_eq!(fleet.read(&project.user_requests_path), "# Requests\n");
    }

    #[test]
    fn header_saved_with_byte_order_mark_is_not_work() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.todo_path, "\u{FEFF}# Todo\n\n");

        let agent = ScriptedAgent::new(Vec::new());

        let outcome = run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        assert_eq!(outcome.stop, LoopStop::Exhausted);
        assert_eq!(outcome.tasks_run, 0);
        assert!(agent.calls().is_empty());
        assert_eq!(fleet.read(&project.todo_path), "\u{FEFF}# Todo\n");
    }

    #[test]
    fn only_the_first_successful_task_mentions_onboarding() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.todo_path, TODO_WITH_ITEM);

        let agent = ScriptedAgent::new(vec![
            ScriptedInvocation::timed_out(),
            ScriptedInvocation::completed(),
            ScriptedInvocation::completed().with_write(&project.todo_path, "# Todo\n"),
        ]);

        run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        let calls = agent.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].prompt.contains("Before starting, read AGENTS.md"));
        assert!(calls[1].prompt.contains("Before starting, read AGENTS.md"));
        assert!(!calls[2].prompt.contains("Before starting, read AGENTS.md"));
        assert!(calls.iter().all(|call| call.timeout == Some(Duration::from_secs(600))));
    }

    #[test]
    fn timeout_during_run_skips_reset() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.tasks_path, TASKS_WITH_ITEM);

        let agent = ScriptedAgent::new(vec![
            ScriptedInvocation::timed_out().with_write(&project.tasks_path, "# Tasks\n\n  \n"),
        ]);

        let outcome = run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        assert_eq!(outcome.stop, LoopStop::Exhausted);
        assert_eq!(outcome.reset, ResetAction::SkippedAfterTimeout);
        assert!(outcome.saw_timeout());
        assert_eq!(fleet.read(&project.tasks_path), "# Tasks\n\n  \n");
    }

    #[test]
    fn agent_failure_aborts_the_project_run() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.todo_path, TODO_WITH_ITEM);

        let agent = ScriptedAgent::new(vec![ScriptedInvocation::failed(3)]);

        let err = run_project(&project.root, &agent, &fleet.project_config()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::Exit { code: Some(3), .. })
        ));
        assert_eq!(fleet.read(&project.todo_path), TODO_WITH_ITEM);
    }

    #[test]
    fn layout_issues_trigger_setup_then_stop_if_lists_stay_missing() {
        let fleet = TestFleet::new().expect("fleet");
        let project_dir = fleet.root().join("bare");
        fs::create_dir(&project_dir).expect("mkdir");
        fs::write(project_dir.join("SEED.md"), "seed\n").expect("seed");

        let agent = ScriptedAgent::new(vec![ScriptedInvocation::failed(1)]);

        let outcome = run_project(&project_dir, &agent, &fleet.project_config()).expect("run");
        assert!(outcome.ran_setup);
        assert_eq!(outcome.stop, LoopStop::LayoutMissing);
        assert_eq!(outcome.reset, ResetAction::NotApplicable);
        let calls = agent.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].timeout, None);
        assert!(calls[0].prompt.contains("Missing project arborist files"));
    }

    #[test]
    fn setup_creating_lists_lets_the_loop_run() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fs::remove_dir_all(project.root.join("docs")).expect("remove docs");

        let agent = ScriptedAgent::new(vec![ScriptedInvocation::completed()]);

        let outcome = run_project(&project.root, &agent, &fleet.project_config()).expect("run");
        assert!(outcome.ran_setup);
        assert_eq!(outcome.stop, LoopStop::Exhausted);
        assert_eq!(outcome.tasks_run, 0);
    }

    #[test]
    fn missing_agent_during_setup_propagates() {
        let fleet = TestFleet::new().expect("fleet");
        let project_dir = fleet.root().join("bare");
        fs::create_dir(&project_dir).expect("mkdir");

        let agent = ScriptedAgent::new(vec![ScriptedInvocation::not_found()]);

        let err = run_project(&project_dir, &agent, &fleet.project_config()).unwrap_err();
        assert!(AgentError::is_not_found(&err));
    }

    #[test]
    fn spent_budget_stops_before_any_task() {
        let fleet = TestFleet::new().expect("fleet");
        let project = fleet.add_project("alpha").expect("project");
        fleet.write(&project.todo_path, TODO_WITH_ITEM);
        let config = ProjectConfig {
            budget: Duration::ZERO,
            ..fleet.project_config()
        };

        let agent = ScriptedAgent::new(Vec::new());
        let outcome = run_project(&project.root, &agent, &config).expect("run");
        assert_eq!(outcome.stop, LoopStop::DeadlineReached);
        assert_eq!(outcome.reset, ResetAction::NotApplicable);
        assert_eq!(fleet.read(&project.todo_path), TODO_WITH_ITEM);
    }
}
