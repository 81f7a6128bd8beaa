//! Delivery hooks for surfaced changes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::session::FileChange;

/// Errors returned by a delivery hook.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// The receiving side has gone away.
    #[error("Change sink closed")]
    Closed,

    /// The hook could not present the change.
    #[error("Delivery failed: {0}")]
    Failed(String),

    /// I/O error while presenting the change.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Side-effecting hook invoked with one change at a time.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Present a change to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the change could not be presented.
    async fn deliver(&self, change: &FileChange) -> Result<(), SinkError>;

    /// Called when [`deliver`](Self::deliver) fails. Logs a warning by
    /// default.
    fn on_delivery_failed(&self, change: &FileChange, error: &SinkError) {
        tracing::warn!(
            change_id = %change.change_id(),
            file = %change.file_path(),
            error = %error,
            "Change delivery failed"
        );
    }
}

/// Deliver a change and report any failure back to the sink.
pub(crate) async fn deliver_reporting(sink: &dyn ChangeSink, change: &FileChange) {
    tracing::debug!(change_id = %change.change_id(), tool = %change.tool(), "Delivering change");
    if let Err(e) = sink.deliver(change).await {
        sink.on_delivery_failed(change, &e);
    }
}

/// Sink that forwards delivered changes into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<FileChange>,
}

impl ChannelSink {
    /// Create a sink and the receiver of its deliveries.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FileChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ChangeSink for ChannelSink {
    async fn deliver(&self, change: &FileChange) -> Result<(), SinkError> {
        self.tx.send(change.clone()).map_err(|_| SinkError::Closed)
    }
}
