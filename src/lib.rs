//! Durable HTTP transaction logging with synchronous subscriptions.
//!
//! Every request observed by the intercepting proxy or crawler is deep-copied,
//! assigned a never-reused monotonic id, persisted, and announced to
//! registered subscribers. Responses that arrive later are attached to their
//! record and broadcast as change events.
//!
//! # Examples
//!
//! Logging and point lookup over an in-memory SQLite store:
//! ```
//! use reqlog::{
//!     log::RequestLog,
//!     message::{HttpHost, RequestSnapshot, Scheme},
//!     persist::sqlite::SqliteLogSink,
//! };
//!
//! let sink = SqliteLogSink::open_in_memory().expect("open sqlite");
//! let log = RequestLog::open(Box::new(sink)).expect("open log");
//!
//! let host = HttpHost {
//!     scheme: Scheme::Http,
//!     name: "example.com".to_string(),
//!     port: 80,
//! };
//! let request = RequestSnapshot {
//!     method: "GET".to_string(),
//!     target: "/".to_string(),
//!     version: "HTTP/1.1".to_string(),
//!     headers: vec![],
//!     body: vec![],
//! };
//!
//! let id = log.add_request(&request, host).expect("add request");
//! assert_eq!(id, 1);
//! assert!(log.lookup(id).expect("record").response.is_none());
//! ```
//!
//! Watching new records as they arrive:
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use reqlog::{
//!     log::RequestLog,
//!     message::{HttpHost, LogRecord, RequestSnapshot, Scheme},
//!     persist::sqlite::SqliteLogSink,
//!     subscribe::UpdateHandle,
//! };
//!
//! let sink = SqliteLogSink::open_in_memory().expect("open sqlite");
//! let log = RequestLog::open(Box::new(sink)).expect("open log");
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink_ids = Arc::clone(&seen);
//! let callback: UpdateHandle = Arc::new(move |record: &LogRecord| {
//!     sink_ids.lock().expect("lock").push(record.id);
//! });
//! log.add_update_listener(callback);
//!
//! let host = HttpHost {
//!     scheme: Scheme::Https,
//!     name: "example.com".to_string(),
//!     port: 443,
//! };
//! let request = RequestSnapshot {
//!     method: "GET".to_string(),
//!     target: "/index.html".to_string(),
//!     version: "HTTP/1.1".to_string(),
//!     headers: vec![],
//!     body: vec![],
//! };
//! let id = log.add_request(&request, host).expect("add request");
//! assert_eq!(*seen.lock().expect("lock"), vec![id]);
//! ```

/// Deep-copy capture of transport objects.
pub mod capture;
/// Identifier allocation, authoritative store, and index helpers.
pub mod core;
/// Request log facade and error type.
pub mod log;
/// Logged transaction domain types.
pub mod message;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Async event-stream adapters.
pub mod runtime;
/// Subscription registry for update and change listeners.
pub mod subscribe;
/// Transport-layer seam traits.
pub mod transport;
/// Shared primitive types.
pub mod types;
