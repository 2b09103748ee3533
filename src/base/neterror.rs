use crate::base::loadstate::LoadState;
use std::fmt;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

/// One failed attempt against a single candidate address.
#[derive(Debug, Clone)]
pub struct AttemptError {
    pub addr: IpAddr,
    /// Stage the attempt had reached when it failed.
    pub stage: LoadState,
    pub error: NetError,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.addr, self.stage, self.error)
    }
}

#[derive(Debug, Error, Clone)]
pub enum NetError {
    #[error("Operation aborted")]
    Aborted,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Could not resolve {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name resolution failed")]
    NameResolutionFailed,
    #[error("Invalid DoH response from {server}: {reason}")]
    DohResponseInvalid { server: String, reason: String },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("TLS handshake with {addr} failed: {reason}")]
    SslHandshakeFailed { addr: String, reason: String },

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Invalid candidate address: {0}")]
    InvalidCandidate(String),
    #[error("Empty response")]
    EmptyResponse,
    #[error("Response headers truncated")]
    ResponseHeadersTruncated,
    #[error("Invalid HTTP response")]
    InvalidHttpResponse,
    #[error("JSON parse error")]
    JsonParseError,

    // Aggregate
    #[error("{}", describe_attempts(.attempts, .timed_out))]
    AllAttemptsFailed {
        attempts: Vec<AttemptError>,
        timed_out: bool,
    },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

fn describe_attempts(attempts: &[AttemptError], timed_out: &bool) -> String {
    let addrs = attempts
        .iter()
        .map(|a| a.addr.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if *timed_out {
        format!("Timed out before any address answered (attempted: [{addrs}])")
    } else {
        format!("No available IP (make sure the resolved ips are correct): [{addrs}]")
    }
}

impl NetError {
    pub fn connection_failed_to(host: &str, port: u16, e: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(e),
        }
    }

    pub fn dns_failed(domain: &str, e: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(e),
        }
    }

    /// True for the resolution family (plain DNS and DoH failures).
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            NetError::NameNotResolved
                | NetError::NameNotResolvedFor { .. }
                | NetError::NameResolutionFailed
                | NetError::DohResponseInvalid { .. }
        )
    }

    /// True for response framing failures.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            NetError::EmptyResponse
                | NetError::ResponseHeadersTruncated
                | NetError::InvalidHttpResponse
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            NetError::ConnectionTimedOut | NetError::AllAttemptsFailed { timed_out: true, .. }
        )
    }

    /// Addresses named by an aggregate failure, in attempt order.
    pub fn attempted_addrs(&self) -> Vec<IpAddr> {
        match self {
            NetError::AllAttemptsFailed { attempts, .. } => {
                attempts.iter().map(|a| a.addr).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Aborted => -3,
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed => -104,
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::SslHandshakeFailed { .. } => -107,
            NetError::ConnectionTimedOut => -118,
            NetError::NameResolutionFailed => -137,
            NetError::DohResponseInvalid { .. } => -137,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::EmptyResponse => -324,
            NetError::ResponseHeadersTruncated => -357,
            NetError::InvalidHttpResponse => -370,
            // Crate-specific codes (custom range starting at -900)
            NetError::InvalidHeader => -905,
            NetError::InvalidCandidate(_) => -906,
            NetError::JsonParseError => -907,
            NetError::AllAttemptsFailed { .. } => -908,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -3 => NetError::Aborted,
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -137 => NetError::NameResolutionFailed,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -324 => NetError::EmptyResponse,
            -357 => NetError::ResponseHeadersTruncated,
            -370 => NetError::InvalidHttpResponse,
            -905 => NetError::InvalidHeader,
            -907 => NetError::JsonParseError,
            _ => NetError::Unknown(code),
        }
    }
}

impl From<io::Error> for NetError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
            io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe => {
                NetError::ConnectionClosed
            }
            io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            _ => NetError::ConnectionFailed,
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(_: url::ParseError) -> Self {
        NetError::InvalidUrl
    }
}
