//! I/O helpers for the supervisor.

pub mod active;
pub mod agent;
pub mod config;
pub mod discovery;
pub mod layout;
pub mod lists;
pub mod paths;
pub mod process;
pub mod prompt;
