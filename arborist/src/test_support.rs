//! Test-only helpers: a scripted agent and temporary fleet fixtures.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::layout::LayoutSpec;
use crate::fleet::FleetConfig;
use crate::io::agent::{Agent, AgentError, InvokeOutcome};
use crate::io::config::SupervisorConfig;
use crate::io::paths::{ProjectPaths, SupervisorPaths};
use crate::project::ProjectConfig;

const SCRIPTED_PROGRAM: &str = "scripted";

/// Create every directory and file the project layout requires, with header-only lists.
pub fn write_complete_layout(root: &Path) -> Result<()> {
    let spec = LayoutSpec::project();
    for dir in spec.required_dirs {
        fs::create_dir_all(root.join(dir)).with_context(|| format!("create {dir}"))?;
    }
    for file in spec.required_root_files {
        fs::write(root.join(file), "").with_context(|| format!("write {file}"))?;
    }
    let nested = root.join(spec.nested_dir);
    for file in spec.nested_files {
        fs::write(nested.join(file), list_header(file)).with_context(|| format!("write {file}"))?;
    }
    Ok(())
}

/// `# Title` header derived from a list file name (`todo.md` -> `# Todo`).
fn list_header(file_name: &str) -> String {
    let stem = file_name.trim_end_matches(".md");
    let mut chars = stem.chars();
    let title: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("# {title}\n")
}

/// Scripted result for a single agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Completed,
    TimedOut,
    Failed(i32),
    NotFound,
}

/// One queued invocation: file edits to apply, then an outcome to return.
#[derive(Debug, Clone)]
pub struct ScriptedInvocation {
    pub outcome: ScriptedOutcome,
    pub writes: Vec<(PathBuf, String)>,
}

impl ScriptedInvocation {
    pub fn new(outcome: ScriptedOutcome) -> Self {
        Self {
            outcome,
            writes: Vec::new(),
        }
    }

    pub fn completed() -> Self {
        Self::new(ScriptedOutcome::Completed)
    }

    pub fn timed_out() -> Self {
        Self::new(ScriptedOutcome::TimedOut)
    }

    pub fn failed(code: i32) -> Self {
        Self::new(ScriptedOutcome::Failed(code))
    }

    pub fn not_found() -> Self {
        Self::new(ScriptedOutcome::NotFound)
    }

    /// Overwrite `path` with `contents` when this invocation runs.
    pub fn with_write(mut self, path: &Path, contents: &str) -> Self {
        self.writes.push((path.to_path_buf(), contents.to_string()));
        self
    }
}

/// A prompt the scripted agent received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    /// `None` for untimed (setup) invocations.
    pub timeout: Option<Duration>,
}

/// Agent that replays queued invocations in order.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    queue: RefCell<VecDeque<ScriptedInvocation>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedAgent {
    pub fn new(invocations: Vec<ScriptedInvocation>) -> Self {
        Self {
            queue: RefCell::new(invocations.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn assert_drained(&self) -> Result<()> {
        let remaining = self.queue.borrow().len();
        if remaining > 0 {
            return Err(anyhow!("scripted agent has {remaining} unused invocations"));
        }
        Ok(())
    }

    fn next(&self, prompt: &str, timeout: Option<Duration>) -> Result<ScriptedOutcome> {
        self.calls.borrow_mut().push(RecordedCall {
            prompt: prompt.to_string(),
            timeout,
        });
        let invocation = self
            .queue
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted agent queue exhausted"))?;
        for (path, contents) in &invocation.writes {
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
        }
        match invocation.outcome {
            ScriptedOutcome::Failed(code) => Err(AgentError::Exit {
                program: SCRIPTED_PROGRAM.to_string(),
                code: Some(code),
            }
            .into()),
            ScriptedOutcome::NotFound => Err(AgentError::NotFound {
                program: SCRIPTED_PROGRAM.to_string(),
            }
            .into()),
            outcome => Ok(outcome),
        }
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&self, prompt: &str) -> Result<()> {
        match self.next(prompt, None)? {
            ScriptedOutcome::TimedOut => Err(anyhow!("untimed invocation cannot time out")),
            _ => Ok(()),
        }
    }

    fn invoke_with_timeout(&self, prompt: &str, timeout: Duration) -> Result<InvokeOutcome> {
        let outcome = self.next(prompt, Some(timeout))?;
        Ok(InvokeOutcome {
            timed_out: outcome == ScriptedOutcome::TimedOut,
        })
    }
}

/// Temporary supervisor home (with a complete template) and an empty fleet root.
pub struct TestFleet {
    _temp: TempDir,
    home: PathBuf,
    root: PathBuf,
}

impl TestFleet {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let home = temp.path().join("home");
        let root = temp.path().join("root");
        let supervisor = SupervisorPaths::new(&home);
        fs::create_dir_all(&supervisor.templates_dir).context("create templates dir")?;
        write_complete_layout(&supervisor.templates_dir)?;
        fs::write(&supervisor.project_setup_path, "# Project setup\n")
            .context("write project setup")?;
        fs::write(&supervisor.complete_next_item_path, "# Complete next item\n")
            .context("write complete next item")?;
        fs::create_dir_all(&root).context("create fleet root")?;
        Ok(Self {
            _temp: temp,
            home,
            root,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn supervisor(&self) -> SupervisorPaths {
        SupervisorPaths::new(&self.home)
    }

    /// Create a project directory with a complete, header-only layout.
    pub fn add_project(&self, name: &str) -> Result<ProjectPaths> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        write_complete_layout(&dir)?;
        Ok(ProjectPaths::new(dir))
    }

    pub fn project_config(&self) -> ProjectConfig {
        ProjectConfig::from_supervisor(self.supervisor(), &SupervisorConfig::default())
    }

    pub fn fleet_config(&self) -> FleetConfig {
        FleetConfig::new(&self.root, self.supervisor(), &SupervisorConfig::default())
    }

    pub fn write(&self, path: &Path, contents: &str) {
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read fixture file")
    }
}
