//! Decoy-SNI transport against a local BoringSSL server.
//!
//! The server holds a self-signed certificate for the true host and records
//! the server name each ClientHello carried.

use boring::asn1::Asn1Time;
use boring::hash::MessageDigest;
use boring::pkey::{PKey, Private};
use boring::rsa::Rsa;
use boring::ssl::{NameType, SslAcceptor, SslMethod};
use boring::x509::{X509NameBuilder, X509};
use decoynet::base::deadline::Deadline;
use decoynet::http::transaction;
use decoynet::socket::{decoy, TlsConfig, TlsConnector, DEFAULT_DECOY_SNI};
use decoynet::{FetchConfig, NetError, RequestSpec};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const TRUE_HOST: &str = "i.pximg.net";

fn self_signed(cn: &str) -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

struct Seen {
    sni: Option<String>,
    head: String,
}

/// TLS server answering every request with a fixed body, reporting the SNI
/// and request head it saw.
async fn tls_server(body: &'static [u8]) -> (SocketAddr, mpsc::UnboundedReceiver<Seen>) {
    let (cert, key) = self_signed(TRUE_HOST);
    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    let acceptor = Arc::new(acceptor.build());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = tokio_boring::accept(&acceptor, tcp).await else {
                    return;
                };
                let sni = tls
                    .ssl()
                    .servername(NameType::HOST_NAME)
                    .map(str::to_string);

                let mut seen = Vec::new();
                let mut buf = [0u8; 1024];
                while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    match tls.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => seen.extend_from_slice(&buf[..n]),
                    }
                }

                let mut response = b"HTTP/1.0 200 OK\r\nServer: test\r\n\r\n".to_vec();
                response.extend_from_slice(body);
                let _ = tls.write_all(&response).await;
                let _ = tls.shutdown().await;

                let _ = tx.send(Seen {
                    sni,
                    head: String::from_utf8_lossy(&seen).into_owned(),
                });
            });
        }
    });

    (addr, rx)
}

#[tokio::test]
async fn test_clienthello_carries_decoy_not_host() {
    let (addr, mut seen) = tls_server(b"hello").await;

    let mut stream = decoy::open(
        addr.ip(),
        addr.port(),
        TRUE_HOST,
        Some("www.apple.com.cn"),
        &TlsConnector::new(&TlsConfig::decoy()).unwrap(),
        &Deadline::never(),
    )
    .await
    .unwrap();

    assert_eq!(stream.server_name(), "www.apple.com.cn");
    assert_eq!(stream.hostname(), TRUE_HOST);

    let request = RequestSpec::get(&format!("https://{TRUE_HOST}:{}/x", addr.port())).unwrap();
    let response = transaction::exchange(&mut stream, &request, &Deadline::never())
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("server"), Some("test"));
    assert_eq!(response.body().as_ref(), b"hello");

    let seen = seen.recv().await.unwrap();
    assert_eq!(seen.sni.as_deref(), Some("www.apple.com.cn"));
    assert!(seen.head.contains(&format!("\r\nHost: {TRUE_HOST}\r\n")));
    assert!(!seen.head.contains("apple"));
}

#[tokio::test]
async fn test_default_decoy_name() {
    let (addr, mut seen) = tls_server(b"").await;

    let mut stream = decoy::open(
        addr.ip(),
        addr.port(),
        TRUE_HOST,
        None,
        &TlsConnector::new(&TlsConfig::decoy()).unwrap(),
        &Deadline::never(),
    )
    .await
    .unwrap();
    assert_eq!(stream.server_name(), DEFAULT_DECOY_SNI);
    assert_eq!(stream.peer_addr(), addr);
    // No ALPN callback on the server side.
    assert!(stream.negotiated_protocol().is_none());
    let _ = stream.close().await;

    let seen = seen.recv().await.unwrap();
    assert_eq!(seen.sni.as_deref(), Some(DEFAULT_DECOY_SNI));
}

#[tokio::test]
async fn test_verified_config_rejects_self_signed() {
    let (addr, _seen) = tls_server(b"").await;

    let err = decoy::open(
        addr.ip(),
        addr.port(),
        TRUE_HOST,
        Some(TRUE_HOST),
        &TlsConnector::new(&TlsConfig::verified()).unwrap(),
        &Deadline::never(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, NetError::SslHandshakeFailed { .. }));
}

#[tokio::test]
async fn test_fetch_end_to_end_with_binary_body() {
    let body: &'static [u8] = b"\x89PNG\r\n\x1a\n\r\n\r\n\x00\x01";
    let (addr, mut seen) = tls_server(body).await;

    let config = FetchConfig::builder()
        .candidate(addr.ip())
        .decoy_sni("www.example.cn")
        .build();
    let request = RequestSpec::get(&format!("https://{TRUE_HOST}:{}/img.png", addr.port()))
        .unwrap()
        .header("Referer", "https://www.pixiv.net/");

    let response = config.fetch(request).await.unwrap();
    assert_eq!(response.body().as_ref(), body);

    let seen = seen.recv().await.unwrap();
    assert_eq!(seen.sni.as_deref(), Some("www.example.cn"));
    assert!(seen.head.starts_with("GET /img.png HTTP/1.0\r\n"));
    assert!(seen.head.contains("\r\nReferer: https://www.pixiv.net/\r\n"));
}

#[tokio::test]
async fn test_fetch_via_single_address() {
    let (addr, _seen) = tls_server(b"via").await;

    let request = RequestSpec::get(&format!("https://{TRUE_HOST}:{}/", addr.port())).unwrap();
    let response = decoynet::fetch_via(addr.ip(), request, None).await.unwrap();
    assert_eq!(response.text(), "via");
}
