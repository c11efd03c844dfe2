//! Event stream payloads for async subscribers.

use crate::types::RequestId;

/// Events forwarded by [`crate::runtime::bridge::EventBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// A new record entered the log.
    RecordAdded {
        /// Created record id.
        id: RequestId,
    },
    /// An existing record gained a response.
    ResponseAttached {
        /// Changed record id.
        id: RequestId,
    },
}
