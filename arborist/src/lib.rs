//! Supervisor that drives an external agent across a fleet of projects.
//!
//! Each project keeps its pending work in plain-text list files. The
//! supervisor never reads task content; it only decides whether work remains,
//! invokes the agent once per unit of work under a time limit, and resets the
//! lists when a run finishes cleanly. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (work detection, layout rules,
//!   path containment, warning suppression). No I/O.
//! - **[`io`]**: Side-effecting operations (filesystem, config, prompts,
//!   process control). Isolated behind the [`io::agent::Agent`] trait so tests
//!   can script the agent.
//!
//! Orchestration modules ([`project`], [`fleet`]) coordinate core logic with
//! I/O to implement the supervisor loop.

pub mod core;
pub mod exit_codes;
pub mod fleet;
pub mod io;
pub mod logging;
pub mod project;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
