//! One-shot HTTP/1.0 exchange over an established transport.
//!
//! The request always carries `Connection: close`, so the peer closing the
//! stream marks the end of the response and no `Content-Length` framing is
//! needed on the read side. `Accept-Encoding: identity` keeps the body
//! uncompressed.

use crate::base::deadline::Deadline;
use crate::base::neterror::NetError;
use crate::http::headers::{is_forced, RequestHeaders};
use crate::http::request::RequestSpec;
use crate::http::response::{parse_response, HttpResponse};
use bytes::BytesMut;
use http::Method;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_CHUNK: usize = 16 * 1024;

const KNOWN_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Serializes the request line, headers and body.
///
/// Header order is `Accept: */*` (its value replaceable by the caller),
/// then the caller's headers in dash-title-case, then `Host`,
/// `Connection`, `Accept-Encoding` and `Content-Length`, which the caller
/// cannot override.
pub fn build_request(
    method: &Method,
    path: &str,
    headers: &RequestHeaders,
    hostname: &str,
    body: &[u8],
) -> Vec<u8> {
    let method = method.as_str().to_ascii_uppercase();
    if !KNOWN_METHODS.contains(&method.as_str()) {
        tracing::warn!(method = %method, "unknown http method");
    }
    let path = if path.is_empty() { "/" } else { path };

    let mut block = RequestHeaders::new();
    block.insert("Accept", "*/*");
    for (name, value) in headers.as_title_case() {
        if is_forced(&name) {
            tracing::debug!(header = %name, "caller header overridden");
            continue;
        }
        block.insert(name, value);
    }
    block.insert("Host", hostname);
    block.insert("Connection", "close");
    block.insert("Accept-Encoding", "identity");
    block.insert("Content-Length", body.len().to_string());

    let mut head = format!("{method} {path} HTTP/1.0\r\n");
    for (name, value) in block.iter() {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}

/// Writes and flushes `bytes`, bounded by `deadline`.
pub async fn write_request<S>(stream: &mut S, bytes: &[u8], deadline: &Deadline) -> Result<(), NetError>
where
    S: AsyncWrite + Unpin,
{
    deadline.observe(stream.write_all(bytes)).await??;
    deadline.observe(stream.flush()).await??;
    Ok(())
}

/// Reads until the peer closes, then parses the accumulated buffer.
///
/// Every read is bounded by `deadline`. A TLS stream torn down without
/// close_notify after data arrived is treated as a normal end of stream.
pub async fn read_response<S>(stream: &mut S, deadline: &Deadline) -> Result<HttpResponse, NetError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buf.reserve(READ_CHUNK);
        match deadline.observe(stream.read_buf(&mut buf)).await? {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !buf.is_empty() => break,
            Err(e) => return Err(e.into()),
        }
    }
    tracing::trace!(bytes = buf.len(), "response stream closed");
    parse_response(buf.freeze())
}

/// Sends `request` over `stream` and reads the whole response.
///
/// `Host` carries `request.hostname()`, the true host, whatever name the
/// transport presented during its handshake.
pub async fn exchange<S>(
    stream: &mut S,
    request: &RequestSpec,
    deadline: &Deadline,
) -> Result<HttpResponse, NetError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let bytes = build_request(
        request.method(),
        &request.path(),
        request.header_list(),
        request.hostname(),
        request.body_bytes(),
    );
    write_request(stream, &bytes, deadline).await?;
    read_response(stream, deadline).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    fn wire(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_request_layout() {
        let headers: RequestHeaders = [("x-test", "1")].into_iter().collect();
        let bytes = build_request(&Method::GET, "/a?b=c", &headers, "i.pximg.net", b"");
        assert_eq!(
            wire(&bytes),
            "GET /a?b=c HTTP/1.0\r\n\
             Accept: */*\r\n\
             X-Test: 1\r\n\
             Host: i.pximg.net\r\n\
             Connection: close\r\n\
             Accept-Encoding: identity\r\n\
             Content-Length: 0\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_forced_headers_not_overridable() {
        let headers: RequestHeaders = [
            ("host", "evil.example"),
            ("Connection", "keep-alive"),
            ("accept-encoding", "gzip"),
            ("Content-Length", "999"),
            ("accept", "image/png"),
        ]
        .into_iter()
        .collect();
        let bytes = build_request(&Method::POST, "/upload", &headers, "real.example", b"abc");
        let text = wire(&bytes);

        assert!(text.starts_with("POST /upload HTTP/1.0\r\nAccept: image/png\r\nHost: real.example\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("Accept-Encoding: identity\r\n"));
        assert!(text.contains("Content-Length: 3\r\n"));
        assert!(!text.contains("evil.example"));
        assert!(!text.contains("gzip"));
        assert!(text.ends_with("\r\n\r\nabc"));
    }

    #[test]
    fn test_method_uppercased() {
        let method = Method::from_bytes(b"get").unwrap();
        let bytes = build_request(&method, "", &RequestHeaders::new(), "h.example", b"");
        assert!(wire(&bytes).starts_with("GET / HTTP/1.0\r\n"));
    }

    #[tokio::test]
    async fn test_exchange_over_duplex() {
        let (mut client, mut server) = duplex(64 * 1024);
        let request = RequestSpec::get("https://i.pximg.net/x.png")
            .unwrap()
            .header("Referer", "https://www.pixiv.net/");

        let server_task = tokio::spawn(async move {
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while find(&seen).is_none() {
                let n = server.read(&mut buf).await.unwrap();
                seen.extend_from_slice(&buf[..n]);
            }
            server
                .write_all(b"HTTP/1.0 200 OK\r\nContent-Type: image/png\r\n\r\n\x89PNG")
                .await
                .unwrap();
            drop(server);
            String::from_utf8(seen).unwrap()
        });

        let resp = exchange(&mut client, &request, &Deadline::never()).await.unwrap();
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.body().as_ref(), b"\x89PNG");

        let seen = server_task.await.unwrap();
        assert!(seen.contains("Referer: https://www.pixiv.net/\r\n"));
        assert!(seen.contains("Host: i.pximg.net\r\n"));
    }

    #[tokio::test]
    async fn test_body_spanning_many_chunks() {
        let (mut client, mut server) = duplex(64);
        tokio::spawn(async move {
            server.write_all(b"HTTP/1.0 200 OK\r\n").await.unwrap();
            server.write_all(b"X-Split: yes\r\n\r\n").await.unwrap();
            for _ in 0..100 {
                server.write_all(&[7u8; 50]).await.unwrap();
            }
        });

        let resp = read_response(&mut client, &Deadline::never()).await.unwrap();
        assert_eq!(resp.header("X-Split"), Some("yes"));
        assert_eq!(resp.body().len(), 5000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_peer_times_out() {
        let (mut client, _server) = duplex(64);
        let deadline = Deadline::new(
            Some(std::time::Duration::from_secs(1)),
            tokio_util::sync::CancellationToken::new(),
        );
        let err = read_response(&mut client, &deadline).await.unwrap_err();
        assert!(matches!(err, NetError::ConnectionTimedOut));
    }

    fn find(buf: &[u8]) -> Option<usize> {
        crate::http::response::find_header_boundary(buf)
    }
}
