//! Bridge from notify-debouncer-full to a tokio channel.

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{event::ModifyKind, EventKind, RecursiveMode},
    DebounceEventResult, DebouncedEvent,
};
use tokio::sync::mpsc;

use super::error::WatcherError;

pub use notify_debouncer_full::notify::RecursiveMode as WatchMode;

/// File system activity observed under a watched root.
#[derive(Debug)]
pub enum FsEvent {
    /// A new file appeared.
    Created(PathBuf),
    /// A file's content changed.
    Modified(PathBuf),
    /// A file was renamed into place, possibly replacing an existing one.
    Renamed(PathBuf),
    /// A file disappeared (deleted or renamed away).
    Removed(PathBuf),
    /// The underlying watcher reported an error.
    Error(WatcherError),
}

impl FsEvent {
    /// Path the event refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Renamed(p) | Self::Removed(p) => {
                Some(p)
            }
            Self::Error(_) => None,
        }
    }
}

/// Keeps a watch alive. Dropping it stops the bridge thread.
#[derive(Debug)]
pub struct WatchHandle {
    root: PathBuf,
    stop_tx: std_mpsc::Sender<()>,
}

impl WatchHandle {
    /// Get the watched root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Start watching `root`, forwarding events for paths accepted by `filter`.
///
/// # Errors
///
/// Returns an error if the root does not exist or the watcher cannot be
/// created.
pub fn spawn_watch<F>(
    root: &Path,
    mode: RecursiveMode,
    filter: F,
) -> Result<(WatchHandle, mpsc::UnboundedReceiver<FsEvent>), WatcherError>
where
    F: Fn(&Path) -> bool + Send + 'static,
{
    if !root.exists() {
        return Err(WatcherError::NotFound(root.to_path_buf()));
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = std_mpsc::channel();
    let (notify_tx, notify_rx) = std_mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(100), None, move |result| {
        let _ = notify_tx.send(result);
    })?;
    debouncer.watch(root, mode)?;

    tracing::debug!(root = %root.display(), ?mode, "Installed file watch");

    thread::spawn(move || {
        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }

            match notify_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(result) => {
                    if !forward(result, &filter, &event_tx) {
                        break;
                    }
                }
                Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // Keep debouncer alive until thread exits
        drop(debouncer);
    });

    Ok((
        WatchHandle {
            root: root.to_path_buf(),
            stop_tx,
        },
        event_rx,
    ))
}

/// Forward one debounce batch. Returns `false` once the receiver is gone.
fn forward<F>(
    result: DebounceEventResult,
    filter: &F,
    event_tx: &mpsc::UnboundedSender<FsEvent>,
) -> bool
where
    F: Fn(&Path) -> bool,
{
    match result {
        Ok(events) => events
            .iter()
            .flat_map(classify)
            .filter(|event| event.path().is_some_and(filter))
            .all(|event| event_tx.send(event).is_ok()),
        Err(errors) => errors
            .into_iter()
            .all(|error| event_tx.send(FsEvent::Error(error.into())).is_ok()),
    }
}

fn classify(event: &DebouncedEvent) -> Vec<FsEvent> {
    event
        .paths
        .iter()
        .filter_map(|path| {
            let path = path.clone();
            match event.kind {
                EventKind::Create(_) => Some(FsEvent::Created(path)),
                EventKind::Modify(ModifyKind::Name(_)) => {
                    if path.exists() {
                        Some(FsEvent::Renamed(path))
                    } else {
                        Some(FsEvent::Removed(path))
                    }
                }
                EventKind::Modify(_) => Some(FsEvent::Modified(path)),
                EventKind::Remove(_) => Some(FsEvent::Removed(path)),
                _ => None,
            }
        })
        .collect()
}
