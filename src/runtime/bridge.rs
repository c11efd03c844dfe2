//! Callback-to-broadcast bridge for async consumers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    log::RequestLog,
    message::LogRecord,
    subscribe::{ChangeHandle, UpdateHandle},
};

use super::events::LogEvent;

/// Forwards log notifications into a `tokio::sync::broadcast` channel so
/// async consumers can await an event stream instead of registering
/// callbacks.
///
/// A lagging receiver loses old events rather than blocking writers,
/// matching the log's best-effort delivery stance.
pub struct EventBridge {
    events_tx: broadcast::Sender<LogEvent>,
    update_callback: UpdateHandle,
    change_callback: ChangeHandle,
}

impl EventBridge {
    /// Registers bridge callbacks on `log`. `capacity` bounds the broadcast
    /// buffer.
    pub fn attach(log: &RequestLog, capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(capacity);

        let update_tx = events_tx.clone();
        let update_callback: UpdateHandle = Arc::new(move |record: &LogRecord| {
            let _ = update_tx.send(LogEvent::RecordAdded { id: record.id });
        });
        log.add_update_listener(Arc::clone(&update_callback));

        let change_tx = events_tx.clone();
        let change_callback: ChangeHandle = Arc::new(move |record: &LogRecord| {
            let _ = change_tx.send(LogEvent::ResponseAttached { id: record.id });
        });
        log.add_change_listener(Arc::clone(&change_callback));

        Self {
            events_tx,
            update_callback,
            change_callback,
        }
    }

    /// New receiver over the event stream. Only events sent after this call
    /// are observed.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events_tx.subscribe()
    }

    /// Unregisters the bridge callbacks from `log`. Receivers drain whatever
    /// was already sent.
    pub fn detach(&self, log: &RequestLog) {
        log.remove_update_listener(&self.update_callback);
        log.remove_change_listener(&self.change_callback);
    }
}
