//! Stable exit codes for the `arborist` binary.

/// Single cycle (`--once`) finished without aborting.
pub const OK: i32 = 0;
/// Startup failed: missing root, broken template layout, or invalid config.
pub const FATAL_STARTUP: i32 = 1;
/// `--once` cycle was abandoned early (agent unavailable or projects unresolvable).
pub const CYCLE_ABORTED: i32 = 2;
