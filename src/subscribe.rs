//! Subscription registry: filtered new-record subscriptions and broadcast
//! change listeners, removable by handle identity.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use crate::message::LogRecord;

/// Sink invoked with each new record whose filter matches.
///
/// Implemented for any `Fn(&LogRecord) + Send + Sync` closure.
pub trait UpdateListener: Send + Sync {
    /// Called once per matching new record, in creation order.
    fn on_record(&self, record: &LogRecord);
}

impl<F> UpdateListener for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn on_record(&self, record: &LogRecord) {
        self(record)
    }
}

/// Predicate over records; a subscription without one matches everything.
///
/// Implemented for any `Fn(&LogRecord) -> bool + Send + Sync` closure.
pub trait RecordFilter: Send + Sync {
    /// True when `record` should be delivered.
    fn matches(&self, record: &LogRecord) -> bool;
}

impl<F> RecordFilter for F
where
    F: Fn(&LogRecord) -> bool + Send + Sync,
{
    fn matches(&self, record: &LogRecord) -> bool {
        self(record)
    }
}

/// Sink invoked whenever an existing record gains a response.
///
/// Implemented for any `Fn(&LogRecord) + Send + Sync` closure.
pub trait ChangeListener: Send + Sync {
    /// Called with the record as it stands after the change.
    fn on_change(&self, record: &LogRecord);
}

impl<F> ChangeListener for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn on_change(&self, record: &LogRecord) {
        self(record)
    }
}

/// Shared update-listener handle; registration identity for removal.
pub type UpdateHandle = Arc<dyn UpdateListener>;

/// Shared filter handle.
pub type FilterHandle = Arc<dyn RecordFilter>;

/// Shared change-listener handle; registration identity for removal.
pub type ChangeHandle = Arc<dyn ChangeListener>;

/// One registered new-record watcher.
pub struct Subscription {
    callback: UpdateHandle,
    filter: Option<FilterHandle>,
    baseline: usize,
}

impl Subscription {
    /// Count of matching records that existed at registration time. Kept for
    /// diagnostics; historical records are never replayed to a subscriber.
    pub fn baseline(&self) -> usize {
        self.baseline
    }

    /// Whether this subscription filters records.
    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }
}

/// Ordered table of new-record subscriptions.
#[derive(Default)]
pub struct UpdateListeners {
    entries: Vec<Subscription>,
}

impl UpdateListeners {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscription. The same handle may be registered more than
    /// once; each registration dispatches independently.
    pub fn add(&mut self, callback: UpdateHandle, filter: Option<FilterHandle>, baseline: usize) {
        self.entries.push(Subscription {
            callback,
            filter,
            baseline,
        });
    }

    /// Removes every subscription holding this handle identity. Returns how
    /// many were removed.
    pub fn remove(&mut self, callback: &UpdateHandle) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|sub| !Arc::ptr_eq(&sub.callback, callback));
        before - self.entries.len()
    }

    /// Invokes matching listeners synchronously, in registration order. A
    /// panicking listener is logged and skipped without affecting the rest.
    pub fn dispatch(&self, record: &LogRecord) {
        for sub in &self.entries {
            if let Some(filter) = &sub.filter {
                if !filter.matches(record) {
                    continue;
                }
            }
            if catch_unwind(AssertUnwindSafe(|| sub.callback.on_record(record))).is_err() {
                warn!(id = record.id, "new-record listener panicked, skipping");
            }
        }
    }

    /// Number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no subscription is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered subscriptions in registration order.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.entries
    }
}

/// Unfiltered broadcast table for record-changed events.
#[derive(Default)]
pub struct ChangeListeners {
    entries: Vec<ChangeHandle>,
}

impl ChangeListeners {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change listener.
    pub fn add(&mut self, callback: ChangeHandle) {
        self.entries.push(callback);
    }

    /// Removes every registration of this handle identity. Returns how many
    /// were removed.
    pub fn remove(&mut self, callback: &ChangeHandle) -> usize {
        let before = self.entries.len();
        self.entries.retain(|cb| !Arc::ptr_eq(cb, callback));
        before - self.entries.len()
    }

    /// Invokes every listener with the changed record, isolating panics.
    pub fn dispatch(&self, record: &LogRecord) {
        for callback in &self.entries {
            if catch_unwind(AssertUnwindSafe(|| callback.on_change(record))).is_err() {
                warn!(id = record.id, "change listener panicked, skipping");
            }
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
