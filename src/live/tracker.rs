//! Live novelty tracking.
//!
//! Decides which change records are new relative to everything seen so far
//! and delivers each new one after a debounce delay. Logs are re-extracted
//! from scratch on every poll, so the same records arrive again and again;
//! the seen-set keeps each change id to at most one delivery.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::scheduler::DebounceScheduler;
use super::sink::{deliver_reporting, ChangeSink};
use crate::session::FileChange;

/// Default delay between scheduling a delivery and running it.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(500);

/// Deduplicating, debounced change notifier.
///
/// A change id moves from unseen to seen once and stays seen until
/// [`reset`](Self::reset).
pub struct LiveChangeTracker {
    sink: Arc<dyn ChangeSink>,
    delivery_delay: Duration,
    enabled: bool,
    seen: HashSet<String>,
    pending: DebounceScheduler<String>,
}

impl std::fmt::Debug for LiveChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChangeTracker")
            .field("delivery_delay", &self.delivery_delay)
            .field("enabled", &self.enabled)
            .field("seen", &self.seen.len())
            .field("pending", &self.pending.pending_count())
            .finish_non_exhaustive()
    }
}

impl LiveChangeTracker {
    /// Create an enabled tracker delivering to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ChangeSink>, delivery_delay: Duration) -> Self {
        Self {
            sink,
            delivery_delay,
            enabled: true,
            seen: HashSet::new(),
            pending: DebounceScheduler::new(),
        }
    }

    /// Mark unseen changes as seen and schedule their delivery.
    ///
    /// Nothing is scheduled when `suppress_delivery` is set or the tracker is
    /// disabled; the changes still count as seen. Returns how many changes
    /// were new.
    ///
    /// # Panics
    ///
    /// Panics if a delivery must be scheduled outside a tokio runtime.
    pub fn process_changes(&mut self, changes: &[FileChange], suppress_delivery: bool) -> usize {
        let mut fresh = 0;
        for change in changes {
            if !self.seen.insert(change.change_id().to_string()) {
                continue;
            }
            fresh += 1;

            if suppress_delivery || !self.enabled {
                tracing::trace!(change_id = %change.change_id(), "Marked seen without delivery");
                continue;
            }
            self.schedule_delivery(change.clone());
        }

        if fresh > 0 {
            tracing::debug!(fresh, suppress_delivery, "Processed new changes");
        }
        fresh
    }

    /// Schedule delivery of one change, replacing any pending delivery with
    /// the same change id.
    ///
    /// Returns `false` when the tracker is disabled.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn schedule_delivery(&mut self, change: FileChange) -> bool {
        if !self.enabled {
            return false;
        }

        let key = change.change_id().to_string();
        let sink = Arc::clone(&self.sink);
        let replaced = self.pending.schedule(key, self.delivery_delay, async move {
            deliver_reporting(sink.as_ref(), &change).await;
        });

        if replaced {
            tracing::debug!("Replaced pending delivery");
        }
        true
    }

    /// Enable or disable delivery.
    ///
    /// Disabling cancels every pending delivery. The seen-set is kept, so
    /// re-enabling never resurrects old changes.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            let cancelled = self.pending.cancel_all();
            tracing::debug!(cancelled, "Live tracker disabled");
        }
        self.enabled = enabled;
    }

    /// Forget every seen change and cancel pending deliveries.
    ///
    /// Used when the active workspace changes.
    pub fn reset(&mut self) {
        let cancelled = self.pending.cancel_all();
        let forgotten = self.seen.len();
        self.seen.clear();
        tracing::debug!(cancelled, forgotten, "Live tracker reset");
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_seen(&self, change_id: &str) -> bool {
        self.seen.contains(change_id)
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Number of deliveries still waiting for their delay.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    #[must_use]
    pub fn delivery_delay(&self) -> Duration {
        self.delivery_delay
    }
}
