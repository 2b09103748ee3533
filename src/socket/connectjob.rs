use crate::base::deadline::Deadline;
use crate::base::loadstate::LoadState;
use crate::base::neterror::{AttemptError, NetError};
use crate::http::request::RequestSpec;
use crate::http::response::HttpResponse;
use crate::http::transaction;
use crate::socket::connector::{Connect, ConnectTarget};

/// One attempt against one candidate: connect, handshake, exchange.
/// Roughly equivalent to net::ConnectJob, extended through the request.
///
/// The job owns its transport. Whatever the outcome, and also when the
/// job's future is dropped mid-flight, the socket is closed before the
/// job is gone.
pub struct ConnectJob<'a> {
    target: ConnectTarget,
    request: &'a RequestSpec,
    connector: &'a dyn Connect,
    deadline: &'a Deadline,
    state: LoadState,
}

impl<'a> ConnectJob<'a> {
    pub fn new(
        target: ConnectTarget,
        request: &'a RequestSpec,
        connector: &'a dyn Connect,
        deadline: &'a Deadline,
    ) -> Self {
        Self {
            target,
            request,
            connector,
            deadline,
            state: LoadState::Idle,
        }
    }

    pub async fn run(mut self) -> Result<HttpResponse, AttemptError> {
        self.state = LoadState::Connecting;
        let mut socket = match self.connector.connect(&self.target, self.deadline).await {
            Ok(socket) => socket,
            Err(e) => {
                // The connector covers TCP and TLS; a handshake error names its stage.
                if matches!(e, NetError::SslHandshakeFailed { .. } | NetError::SslProtocolError) {
                    self.state = LoadState::SslHandshake;
                }
                return Err(self.fail(e));
            }
        };

        let bytes = transaction::build_request(
            self.request.method(),
            &self.request.path(),
            self.request.header_list(),
            &self.target.hostname,
            self.request.body_bytes(),
        );

        self.state = LoadState::SendingRequest;
        if let Err(e) = transaction::write_request(&mut socket, &bytes, self.deadline).await {
            return Err(self.fail(e));
        }

        self.state = LoadState::ReadingResponse;
        let result = transaction::read_response(&mut socket, self.deadline).await;
        drop(socket);

        result.map_err(|e| self.fail(e))
    }

    fn fail(&self, error: NetError) -> AttemptError {
        AttemptError {
            addr: self.target.addr,
            stage: self.state,
            error,
        }
    }
}
