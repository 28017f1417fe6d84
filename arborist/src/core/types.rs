//! Shared outcome types for project orchestration.
//!
//! These carry control signals only (why a run stopped, what happened to the
//! list files). Task content never flows back through them.

/// Reason a project's task loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// The project directory does not exist; nothing was attempted.
    ProjectMissing,
    /// No list file has pending work.
    Exhausted,
    /// The project's time budget ran out before another task could start.
    DeadlineReached,
    /// A required list file is still missing after setup.
    LayoutMissing,
}

impl LoopStop {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStop::ProjectMissing => "project_missing",
            LoopStop::Exhausted => "exhausted",
            LoopStop::DeadlineReached => "deadline_reached",
            LoopStop::LayoutMissing => "layout_missing",
        }
    }
}

/// What happened to the list files when the loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAction {
    /// Lists were truncated back to their headers.
    Applied,
    /// Work was exhausted, but a task timed out earlier in the run.
    SkippedAfterTimeout,
    /// The loop stopped for a reason that never resets.
    NotApplicable,
}

/// Summary of one project orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutcome {
    pub stop: LoopStop,
    /// Whether a setup invocation ran because of layout issues.
    pub ran_setup: bool,
    /// Task invocations started (timed out ones included).
    pub tasks_run: u32,
    /// Task invocations that hit the per-task timeout.
    pub timeouts: u32,
    pub reset: ResetAction,
}

impl ProjectOutcome {
    pub fn saw_timeout(&self) -> bool {
        self.timeouts > 0
    }
}

/// Decide the exit action for a finished task loop.
pub fn reset_action(stop: LoopStop, saw_timeout: bool) -> ResetAction {
    match (stop, saw_timeout) {
        (LoopStop::Exhausted, false) => ResetAction::Applied,
        (LoopStop::Exhausted, true) => ResetAction::SkippedAfterTimeout,
        _ => ResetAction::NotApplicable,
    }
}
