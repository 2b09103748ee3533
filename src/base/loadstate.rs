/// The stage an attempt has reached.
/// Roughly matches net/base/load_states.h, restricted to the stages a
/// single-shot decoy-SNI exchange passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Not started yet.
    #[default]
    Idle,

    /// Connecting to the candidate (TCP handshake).
    Connecting,

    /// TLS handshake with the decoy server name.
    SslHandshake,

    /// Writing the HTTP/1.0 request.
    SendingRequest,

    /// Draining the response until the peer closes.
    ReadingResponse,
}
