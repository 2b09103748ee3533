//! HTTP/1.0 response parsing.
//!
//! The engine reads until the peer closes, then splits the accumulated
//! buffer at the first `CRLF CRLF`. The scan is over raw bytes; the body
//! may hold anything.

use crate::base::neterror::NetError;
use bytes::Bytes;
use http::StatusCode;
use std::collections::HashMap;

const HEADER_BOUNDARY: &[u8] = b"\r\n\r\n";

/// A fully received response.
///
/// Header keys are stored as they appeared on the wire; a later line with
/// the same key replaces an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status_code: u16,
    status_message: String,
    version: String,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl HttpResponse {
    /// Get the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Status as a typed code, when it is in range.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Reason phrase, possibly empty or multi-word.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Version token from the status line, e.g. `HTTP/1.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|_| NetError::JsonParseError)
    }
}

/// Position of the first `CRLF CRLF` in `buf`.
pub fn find_header_boundary(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_BOUNDARY.len())
        .position(|w| w == HEADER_BOUNDARY)
}

/// Parses a complete response buffer.
///
/// Fails with `EmptyResponse` when nothing was received,
/// `ResponseHeadersTruncated` when the header block never ends, and
/// `InvalidHttpResponse` when the status line carries no numeric code.
pub fn parse_response(raw: Bytes) -> Result<HttpResponse, NetError> {
    if raw.is_empty() {
        return Err(NetError::EmptyResponse);
    }
    let boundary = find_header_boundary(&raw).ok_or(NetError::ResponseHeadersTruncated)?;

    let head = String::from_utf8_lossy(&raw[..boundary]);
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.split(' ');
    let version = parts.next().unwrap_or_default().to_string();
    let status_code = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(NetError::InvalidHttpResponse)?;
    let status_message = parts.collect::<Vec<_>>().join(" ");

    let mut headers = HashMap::new();
    for line in lines {
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        headers.insert(key.to_string(), value.trim().to_string());
    }

    Ok(HttpResponse {
        status_code,
        status_message,
        version,
        headers,
        body: raw.slice(boundary + HEADER_BOUNDARY.len()..),
    })
}
