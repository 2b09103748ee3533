use crate::base::neterror::NetError;
use boring::ssl::{
    ConnectConfiguration, SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion,
};
use std::fmt;
use std::sync::Arc;

/// Configuration for the TLS ClientHello and peer verification.
///
/// The decoy transport uses [`TlsConfig::decoy`], which disables peer
/// verification: the server presents a certificate for the real host while
/// the ClientHello names the decoy, so neither name would verify. The
/// channel is confidential but the endpoint is not authenticated.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: String,
    pub alpn_protos: Vec<String>,
    pub curves: Vec<String>, // Curve names like "X25519", "P-256"
    pub sigalgs: String,     // OpenSSL sigalgs string
    pub verify_peer: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::decoy()
    }
}

impl TlsConfig {
    /// Chrome-like ClientHello, HTTP/1.1 ALPN only, no peer verification.
    pub fn decoy() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            cipher_list:
                "TLS_AES_128_GCM_SHA256:TLS_AES_256_GCM_SHA384:TLS_CHACHA20_POLY1305_SHA256:\
                ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:\
                ECDHE-RSA-AES128-SHA:ECDHE-RSA-AES256-SHA:\
                AES128-GCM-SHA256:AES256-GCM-SHA384:AES128-SHA:AES256-SHA"
                    .to_string(),
            // The engine speaks HTTP/1.0; never advertise h2.
            alpn_protos: vec!["http/1.1".to_string()],
            curves: vec![
                "X25519".to_string(),
                "P-256".to_string(),
                "P-384".to_string(),
            ],
            sigalgs: "ECDSA+SHA256:RSA-PSS+SHA256:RSA+SHA256:\
                ECDSA+SHA384:RSA-PSS+SHA384:RSA+SHA384:\
                RSA-PSS+SHA512:RSA+SHA512"
                .to_string(),
            verify_peer: false,
        }
    }

    /// Same ClientHello, with certificate and hostname verification.
    /// Used for DoH endpoints, which are contacted under their real name.
    pub fn verified() -> Self {
        Self {
            verify_peer: true,
            ..Self::decoy()
        }
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        builder
            .set_cipher_list(&self.cipher_list)
            .map_err(|_| NetError::SslProtocolError)?;

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder
                .set_alpn_protos(&alpn_wire)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.sigalgs.is_empty() {
            builder
                .set_sigalgs_list(&self.sigalgs)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.curves.is_empty() {
            let curves_str = self.curves.join(":");
            builder
                .set_curves_list(&curves_str)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses. An empty
    /// name omits the extension entirely.
    pub fn should_set_sni(host: &str) -> bool {
        !host.is_empty() && host.parse::<std::net::IpAddr>().is_err()
    }
}

/// A BoringSSL connector built once from a [`TlsConfig`] and shared by
/// every connection made with it.
#[derive(Clone)]
pub struct TlsConnector {
    inner: Arc<SslConnector>,
    verify_peer: bool,
}

impl TlsConnector {
    pub fn new(config: &TlsConfig) -> Result<Self, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        config.apply_to_builder(&mut builder)?;
        Ok(Self {
            inner: Arc::new(builder.build()),
            verify_peer: config.verify_peer,
        })
    }

    /// Per-connection configuration. `server_name` is what goes into the
    /// ClientHello; hostname verification follows `verify_peer`.
    pub fn configure(&self, server_name: &str) -> Result<ConnectConfiguration, NetError> {
        let mut config = self
            .inner
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(server_name));
        config.set_verify_hostname(self.verify_peer);
        Ok(config)
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }
}

impl fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConnector")
            .field("verify_peer", &self.verify_peer)
            .finish_non_exhaustive()
    }
}
