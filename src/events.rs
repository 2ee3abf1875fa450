//! Change notifications published after writes.
//!
//! The handler only knows the [`EventSink`] seam. Fan-out to SSE or
//! WebSocket clients lives in the host; [`BroadcastSink`] hands events to
//! any number of in-process subscribers over a `tokio` broadcast channel.

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEvent {
    /// Configured event kind, e.g. `help_request`
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    /// The inserted row as it was returned to the caller
    pub data: serde_json::Value,
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: TableEvent);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: TableEvent) {}
}

#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<TableEvent>,
}

impl BroadcastSink {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: TableEvent) {
        let kind = event.kind.clone();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(kind = %kind, receivers, "event published"),
            Err(_) => tracing::debug!(kind = %kind, "event dropped, no subscribers"),
        }
    }
}
