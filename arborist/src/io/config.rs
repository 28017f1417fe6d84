//! Supervisor configuration stored in `arborist.toml` in the supervisor home.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Supervisor configuration (TOML).
///
/// Every field is optional; a missing file or field falls back to the
/// built-in schedule (10-minute tasks, 4-hour project budget, 60-second
/// cycle sleep).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Wall-clock budget for one project's task loop, in seconds.
    pub project_budget_secs: u64,

    /// Timeout for a single task invocation, in seconds.
    pub task_timeout_secs: u64,

    /// Time between SIGTERM and SIGKILL for a timed-out agent, in seconds.
    pub kill_grace_secs: u64,

    /// Sleep between fleet cycles, in seconds.
    pub poll_interval_secs: u64,

    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Command prefix; the prompt is appended as the final argument.
    pub command: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: vec!["codex".to_string(), "exec".to_string()],
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            project_budget_secs: 4 * 60 * 60,
            task_timeout_secs: 10 * 60,
            kill_grace_secs: 5,
            poll_interval_secs: 60,
            agent: AgentConfig::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_budget_secs == 0 {
            return Err(anyhow!("project_budget_secs must be > 0"));
        }
        if self.task_timeout_secs == 0 {
            return Err(anyhow!("task_timeout_secs must be > 0"));
        }
        if self.kill_grace_secs == 0 {
            return Err(anyhow!("kill_grace_secs must be > 0"));
        }
        if self.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be > 0"));
        }
        if self.agent.command.is_empty() || self.agent.command[0].trim().is_empty() {
            return Err(anyhow!("agent.command must be a non-empty array"));
        }
        Ok(())
    }

    pub fn project_budget(&self) -> Duration {
        Duration::from_secs(self.project_budget_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.kill_grace_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SupervisorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SupervisorConfig> {
    if !path.exists() {
        let cfg = SupervisorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SupervisorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Load a config file the operator named explicitly; a missing file is an error.
pub fn load_required_config(path: &Path) -> Result<SupervisorConfig> {
    if !path.is_file() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }
    load_config(path)
}
