//! Async event-stream adapters over the synchronous log.

/// Callback-to-broadcast bridge.
pub mod bridge;
/// Event stream payloads.
pub mod events;
