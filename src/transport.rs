//! Seam traits for request/response objects supplied by the proxy and
//! crawler layers.
//!
//! The log never stores these directly; [`crate::capture`] deep-copies them
//! into owned snapshots first, so later mutation of transport buffers cannot
//! reach logged data.

/// Read-only view of an outgoing request as the transport layer holds it.
pub trait TransportRequest {
    /// Request method token.
    fn method(&self) -> &str;
    /// Request target as sent on the wire.
    fn target(&self) -> &str;
    /// HTTP-version token from the request line.
    fn version(&self) -> &str;
    /// Header pairs in wire order.
    fn headers(&self) -> Vec<(&str, &[u8])>;
    /// Request body bytes.
    fn body(&self) -> &[u8];
}

/// Read-only view of a response as the transport layer holds it.
pub trait TransportResponse {
    /// Status code.
    fn status(&self) -> u16;
    /// Reason phrase, possibly empty.
    fn reason(&self) -> &str;
    /// HTTP-version token from the status line.
    fn version(&self) -> &str;
    /// Header pairs in wire order.
    fn headers(&self) -> Vec<(&str, &[u8])>;
    /// Response body bytes.
    fn body(&self) -> &[u8];
}

// Owned snapshots satisfy the transport view themselves, so captured
// messages can be re-logged and tests can build transports directly.

impl TransportRequest for crate::message::RequestSnapshot {
    fn method(&self) -> &str {
        &self.method
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn headers(&self) -> Vec<(&str, &[u8])> {
        self.headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_slice()))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

impl TransportResponse for crate::message::ResponseSnapshot {
    fn status(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn headers(&self) -> Vec<(&str, &[u8])> {
        self.headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_slice()))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
