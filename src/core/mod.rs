//! In-memory authoritative state: identifier allocation, record store,
//! index helpers.

/// Identifier allocator and its persisted singleton state.
pub mod allocator;
/// Helper index aliases.
pub mod indices;
/// Authoritative record store and queries.
pub mod store;
