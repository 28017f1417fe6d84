//! Fleet-level scheduling: resolve the project set, run each project in turn,
//! sleep, repeat.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{error, info, instrument, warn};

use crate::core::layout::{LayoutSpec, format_issues};
use crate::core::types::ProjectOutcome;
use crate::core::warnings::WarnedEntries;
use crate::io::active::resolve_active_projects;
use crate::io::agent::{Agent, AgentError};
use crate::io::config::SupervisorConfig;
use crate::io::discovery::discover_projects;
use crate::io::layout::validate_layout;
use crate::io::paths::{ACTIVE_PROJECTS_FILE, SupervisorPaths};
use crate::project::{ProjectConfig, run_project};

/// Fail if the supervisor's own reference template is incomplete.
pub fn validate_template(supervisor: &SupervisorPaths) -> Result<()> {
    let spec = LayoutSpec::template();
    let issues = validate_layout(&supervisor.templates_dir, &spec);
    if issues.has_issues() {
        return Err(anyhow!(
            "template layout in {} is invalid:\n{}",
            supervisor.templates_dir.display(),
            format_issues(&spec, &issues)
        ));
    }
    Ok(())
}

/// Settings for the fleet loop.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Directory whose projects are supervised.
    pub root: PathBuf,
    /// Allow-list file; when it names projects, discovery is skipped.
    pub active_projects_path: PathBuf,
    pub project: ProjectConfig,
    /// Sleep between cycles.
    pub poll_interval: Duration,
}

impl FleetConfig {
    pub fn new(root: impl Into<PathBuf>, supervisor: SupervisorPaths, cfg: &SupervisorConfig) -> Self {
        let root = root.into();
        Self {
            active_projects_path: root.join(ACTIVE_PROJECTS_FILE),
            project: ProjectConfig::from_supervisor(supervisor, cfg),
            poll_interval: cfg.poll_interval(),
            root,
        }
    }
}

/// Result of running one project within a cycle.
#[derive(Debug)]
pub struct ProjectReport {
    pub path: PathBuf,
    /// The outcome, or the rendered error that aborted this project.
    pub result: std::result::Result<ProjectOutcome, String>,
}

/// Summary of one fleet cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub projects: Vec<ProjectReport>,
    /// The cycle stopped early (agent unavailable or project set unresolvable).
    pub aborted: bool,
}

/// Sequential fleet scheduler.
///
/// Holds the allow-list warning state across cycles; nothing else persists.
pub struct Fleet<'a, A: Agent> {
    agent: &'a A,
    config: FleetConfig,
    warned: WarnedEntries,
}

impl<'a, A: Agent> Fleet<'a, A> {
    pub fn new(agent: &'a A, config: FleetConfig) -> Self {
        Self {
            agent,
            config,
            warned: WarnedEntries::new(),
        }
    }

    /// Run cycles forever, sleeping between them.
    pub fn run_forever(&mut self) -> ! {
        loop {
            self.run_cycle();
            info!(
                sleep_secs = self.config.poll_interval.as_secs(),
                "all projects processed; waiting"
            );
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Resolve the project set and run each project once, in order.
    ///
    /// Per-project failures are recorded and the cycle moves on; a missing
    /// agent executable stops the rest of the cycle.
    #[instrument(skip_all, fields(root = %self.config.root.display()))]
    pub fn run_cycle(&mut self) -> CycleReport {
        let projects = match self.resolve_projects() {
            Ok(projects) => projects,
            Err(err) => {
                error!(err = %format!("{err:#}"), "failed to resolve projects");
                return CycleReport {
                    projects: Vec::new(),
                    aborted: true,
                };
            }
        };
        if projects.is_empty() {
            info!("no projects found");
        }

        let mut report = CycleReport::default();
        for project in projects {
            info!(project = %project.display(), "processing project");
            match run_project(&project, self.agent, &self.config.project) {
                Ok(outcome) => report.projects.push(ProjectReport {
                    path: project,
                    result: Ok(outcome),
                }),
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(project = %project.display(), err = %message, "project run failed");
                    let not_found = AgentError::is_not_found(&err);
                    report.projects.push(ProjectReport {
                        path: project,
                        result: Err(message),
                    });
                    if not_found {
                        error!("agent unavailable; abandoning the rest of this cycle");
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        report
    }

    /// Active projects from the allow-list, falling back to discovery.
    pub fn resolve_projects(&mut self) -> Result<Vec<PathBuf>> {
        let active = resolve_active_projects(&self.config.root, &self.config.active_projects_path)?;

        let fresh = self
            .warned
            .diff(active.missing.iter().map(|missing| missing.entry.as_str()));
        for missing in active
            .missing
            .iter()
            .filter(|missing| fresh.contains(&missing.entry.as_str()))
        {
            warn!(
                entry = %missing.entry,
                reason = %missing.reason,
                file = %self.config.active_projects_path.display(),
                "skipping active project entry"
            );
        }

        match active.projects {
            Some(projects) if !projects.is_empty() => Ok(projects),
            _ => discover_projects(&self.config.root),
        }
    }

    /// Entries currently suppressed from repeat warnings.
    pub fn warned_entries(&self) -> &WarnedEntries {
        &self.warned
    }
}
