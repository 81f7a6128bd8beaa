//! Live surfacing of agent changes.
//!
//! The feed re-reads the active session log, the tracker filters out what
//! was already seen, and the scheduler delivers each new change to a sink
//! after a short delay.

mod feed;
mod scheduler;
mod sink;
mod tracker;

pub use feed::LiveFeed;
pub use scheduler::DebounceScheduler;
pub use sink::{ChangeSink, ChannelSink, SinkError};
pub(crate) use sink::deliver_reporting;
pub use tracker::{LiveChangeTracker, DEFAULT_DELIVERY_DELAY};
