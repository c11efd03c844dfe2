//! Deep-copy capture of transport objects into owned snapshots.
//!
//! Capture runs before an identifier is allocated, so a malformed transport
//! object surfaces as a recoverable [`CaptureError`] without burning an id.

use crate::{
    message::{HeaderField, RequestSnapshot, ResponseSnapshot},
    transport::{TransportRequest, TransportResponse},
};

/// Rejected transport object during deep copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Method was empty or not an RFC token.
    InvalidMethod(String),
    /// Request target was empty or contained whitespace/controls.
    InvalidTarget(String),
    /// Header name was empty or not an RFC token.
    InvalidHeaderName(String),
    /// Status code outside 100..=599.
    InvalidStatus(u16),
}

/// Copies `request` into an owned [`RequestSnapshot`].
///
/// No reference into the transport object remains reachable from the result.
pub fn capture_request<R: TransportRequest + ?Sized>(
    request: &R,
) -> Result<RequestSnapshot, CaptureError> {
    let method = request.method();
    if method.is_empty() || method.chars().any(|c| !is_tchar(c)) {
        return Err(CaptureError::InvalidMethod(method.to_string()));
    }

    let target = request.target();
    if target.is_empty() || target.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CaptureError::InvalidTarget(target.to_string()));
    }

    Ok(RequestSnapshot {
        method: method.to_string(),
        target: target.to_string(),
        version: request.version().to_string(),
        headers: copy_headers(request.headers())?,
        body: request.body().to_vec(),
    })
}

/// Copies `response` into an owned [`ResponseSnapshot`].
pub fn capture_response<R: TransportResponse + ?Sized>(
    response: &R,
) -> Result<ResponseSnapshot, CaptureError> {
    let status = response.status();
    if !(100..=599).contains(&status) {
        return Err(CaptureError::InvalidStatus(status));
    }

    Ok(ResponseSnapshot {
        status,
        reason: response.reason().to_string(),
        version: response.version().to_string(),
        headers: copy_headers(response.headers())?,
        body: response.body().to_vec(),
    })
}

fn copy_headers(pairs: Vec<(&str, &[u8])>) -> Result<Vec<HeaderField>, CaptureError> {
    let mut out = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        if name.is_empty() || name.chars().any(|c| !is_tchar(c)) {
            return Err(CaptureError::InvalidHeaderName(name.to_string()));
        }
        out.push(HeaderField {
            name: name.to_string(),
            value: value.to_vec(),
        });
    }
    Ok(out)
}

// RFC 9110 tchar.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}
