//! Agent abstraction for task and setup invocations.
//!
//! The [`Agent`] trait decouples orchestration from the actual backend
//! (`codex exec` by default). Tests use a scripted agent that edits list files
//! and returns predetermined outcomes without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::io::config::AgentConfig;
use crate::io::process::{RelayedChild, spawn_relayed};

/// Outcome of a timed invocation. A timeout is expected, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeOutcome {
    pub timed_out: bool,
}

/// Hard agent failures, recoverable from `anyhow::Error` via `downcast_ref`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    /// The agent executable is unavailable; no project can make progress.
    #[error("{program} CLI not found on PATH")]
    NotFound { program: String },
    /// The agent exited unsuccessfully without timing out.
    #[error("{program} exec {}", describe_exit(.code))]
    Exit { program: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl AgentError {
    /// True if `err` carries [`AgentError::NotFound`].
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::NotFound { .. })
        )
    }
}

/// Abstraction over agent execution backends.
pub trait Agent {
    /// Run the agent to completion with no time limit.
    fn invoke(&self, prompt: &str) -> Result<()>;

    /// Run the agent, terminating it once `timeout` elapses.
    fn invoke_with_timeout(&self, prompt: &str, timeout: Duration) -> Result<InvokeOutcome>;
}

/// Agent that spawns a configured command with the prompt as its last argument.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
    kill_grace: Duration,
}

impl CommandAgent {
    pub fn new(config: &AgentConfig, workdir: impl Into<PathBuf>, kill_grace: Duration) -> Self {
        let mut command = config.command.iter().cloned();
        Self {
            program: command.next().unwrap_or_default(),
            args: command.collect(),
            workdir: workdir.into(),
            kill_grace,
        }
    }

    fn command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(prompt).current_dir(&self.workdir);
        cmd
    }

    fn spawn(&self, prompt: &str) -> Result<RelayedChild> {
        match spawn_relayed(&mut self.command(prompt)) {
            Ok(child) => {
                debug!(pid = child.id(), "agent started");
                Ok(child)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AgentError::NotFound {
                    program: self.program.clone(),
                }
                .into())
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("spawn {} in {}", self.program, self.workdir.display()))),
        }
    }

    fn exit_error(&self, code: Option<i32>) -> anyhow::Error {
        AgentError::Exit {
            program: self.program.clone(),
            code,
        }
        .into()
    }
}

impl Agent for CommandAgent {
    #[instrument(skip_all, fields(program = %self.program))]
    fn invoke(&self, prompt: &str) -> Result<()> {
        info!(workdir = %self.workdir.display(), "starting agent");
        let status = self.spawn(prompt)?.wait()?;
        if !status.success() {
            warn!(exit_code = ?status.code(), "agent failed");
            return Err(self.exit_error(status.code()));
        }
        debug!("agent completed successfully");
        Ok(())
    }

    #[instrument(skip_all, fields(program = %self.program, timeout_secs = timeout.as_secs()))]
    fn invoke_with_timeout(&self, prompt: &str, timeout: Duration) -> Result<InvokeOutcome> {
        info!(workdir = %self.workdir.display(), "starting agent");
        let outcome = self
            .spawn(prompt)?
            .wait_with_timeout(timeout, self.kill_grace)?;
        if outcome.timed_out {
            info!(
                timeout_secs = timeout.as_secs(),
                "agent exceeded its timeout; stopped and will retry"
            );
            return Ok(InvokeOutcome { timed_out: true });
        }
        if !outcome.status.success() {
            warn!(exit_code = ?outcome.status.code(), "agent failed");
            return Err(self.exit_error(outcome.status.code()));
        }
        debug!("agent completed successfully");
        Ok(InvokeOutcome { timed_out: false })
    }
}
