//! Keyed table of cancellable delayed tasks.
//!
//! Each key has at most one pending task. Scheduling a key again cancels the
//! pending task and replaces it, so the last call wins.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Pending {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Pending {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Per-key debounced scheduling on the tokio runtime.
///
/// A task that has already left its delay and started running can no longer
/// be cancelled; cancellation only prevents tasks still waiting.
#[derive(Debug)]
pub struct DebounceScheduler<K> {
    pending: HashMap<K, Pending>,
}

impl<K> Default for DebounceScheduler<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> DebounceScheduler<K> {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing any task pending for `key`.
    ///
    /// Returns `true` if a still-pending task was replaced.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn schedule<F>(&mut self, key: K, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.prune();
        let replaced = self.cancel(&key);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => task.await,
            }
        });

        self.pending.insert(key, Pending { cancel, handle });
        replaced
    }

    /// Cancel the task pending for `key`.
    ///
    /// Returns `true` if a task was still waiting.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some(pending) => {
                let live = pending.is_live();
                pending.cancel.cancel();
                live
            }
            None => false,
        }
    }

    /// Cancel every pending task and clear the table.
    ///
    /// Returns the number of tasks that were still waiting.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for (_, pending) in self.pending.drain() {
            if pending.is_live() {
                cancelled += 1;
            }
            pending.cancel.cancel();
        }
        cancelled
    }

    /// Whether a task for `key` has not finished yet.
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.get(key).is_some_and(Pending::is_live)
    }

    /// Number of tasks that have not finished yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|p| p.is_live()).count()
    }

    fn prune(&mut self) {
        self.pending.retain(|_, p| p.is_live());
    }
}

impl<K> Drop for DebounceScheduler<K> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.cancel.cancel();
        }
    }
}
