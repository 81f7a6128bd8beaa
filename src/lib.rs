//! Claude Changes - Reconstruct and surface file changes from Claude Code
//! session logs.

pub mod config;
pub mod display;
pub mod heuristic;
pub mod live;
pub mod session;
pub mod watch;
