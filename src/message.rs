//! Logged transaction domain types: hosts, message snapshots, records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::RequestId;

/// URI scheme of a logged transaction's destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// Plain-text HTTP.
    Http,
    /// TLS-wrapped HTTP.
    Https,
}

impl Scheme {
    /// Lowercase scheme token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Destination endpoint of a logged transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpHost {
    /// Scheme used to reach the host.
    pub scheme: Scheme,
    /// Host name or address literal.
    pub name: String,
    /// TCP port.
    pub port: u16,
}

impl HttpHost {
    /// Canonical `scheme://name:port` key used by the host index.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.name, self.port)
    }
}

/// Owned header name/value pair. Values are raw bytes; names are ASCII tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    /// Header name.
    pub name: String,
    /// Header value bytes, unmodified.
    pub value: Vec<u8>,
}

/// Owned deep copy of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Request method token.
    pub method: String,
    /// Request target as sent on the wire.
    pub target: String,
    /// HTTP-version token from the request line.
    pub version: String,
    /// Header fields in wire order.
    pub headers: Vec<HeaderField>,
    /// Request body bytes.
    pub body: Vec<u8>,
}

/// Owned deep copy of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// Status code.
    pub status: u16,
    /// Reason phrase, possibly empty.
    pub reason: String,
    /// HTTP-version token from the status line.
    pub version: String,
    /// Header fields in wire order.
    pub headers: Vec<HeaderField>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// One logged transaction.
///
/// The id and request are immutable after creation; the response may be
/// attached later, after which a change notification fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Stable transaction identifier.
    pub id: RequestId,
    /// Destination endpoint.
    pub host: HttpHost,
    /// Captured request.
    pub request: RequestSnapshot,
    /// Captured response, absent until one arrives.
    pub response: Option<ResponseSnapshot>,
    /// Creation timestamp in milliseconds since epoch.
    pub ts_ms: u64,
}
