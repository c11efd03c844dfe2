//! Shared primitive identifiers.

/// Monotonic transaction identifier, never reused across restarts.
pub type RequestId = u64;

/// First identifier handed out by a fresh allocator.
pub const FIRST_REQUEST_ID: RequestId = 1;
