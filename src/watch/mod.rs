//! File watching shared by the session log feed and the heuristic detector.

mod bridge;
mod error;

pub use bridge::{spawn_watch, FsEvent, WatchHandle, WatchMode};
pub use error::WatcherError;
