//! Heuristic change detection.
//!
//! An independent source of change records that never reads session logs.
//! It diffs text snapshots taken at editor lifecycle points and reads files
//! that appear or change on disk, producing records in the same shape as the
//! log-derived ones.

mod detector;
mod exclude;
mod snapshot;
mod watch;

pub use detector::{
    HeuristicDetector, SettleTrigger, SettledFile, SettledReceiver, MAX_WATCH_DEPTH,
};
pub use exclude::ExclusionSet;
pub use snapshot::SnapshotStore;
pub use watch::{ExtensionFilter, WorkspaceWatcher};
