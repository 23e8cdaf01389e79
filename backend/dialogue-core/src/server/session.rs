//! Per-connection state machine.
//!
//! ```text
//! Unauthenticated ──AUTH_REQUEST──► Authenticated ──Stop / EOF / error──► Closed
//!        │                                 ▲
//!        └── anything else ──► Closed      └── (start here when auth is disabled)
//! ```
//!
//! One socket read is one message. Within a session requests are handled
//! strictly in arrival order.

use crate::error::server::ServerError;
use crate::identity::{ClientIdentity, SessionId};
use crate::protocol::{
    AUTH_FAILED, AUTH_REQUEST, AUTH_REQUIRED, AUTH_SUCCESS, INVALID_REQUEST, INVALID_TOKEN,
    Request,
};
use crate::server::context::ServerContext;
use crate::server::registry::SessionLease;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::ErrorKind;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout as TokioTimeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed its side (empty read).
    Disconnected,
    /// Client sent `Stop`.
    StopRequested,
    /// First message was not the auth handshake.
    AuthRequired,
    /// Handshake was rejected.
    AuthFailed,
    /// Read or write failed.
    TransportError,
    /// Evicted by a newer connection or closed by server shutdown.
    ClosedByServer,
}

impl Display for CloseReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let reason = match self {
            CloseReason::Disconnected => "client disconnected",
            CloseReason::StopRequested => "stop requested",
            CloseReason::AuthRequired => "authentication required",
            CloseReason::AuthFailed => "authentication failed",
            CloseReason::TransportError => "transport error",
            CloseReason::ClosedByServer => "closed by server",
        };
        write!(formatter, "{reason}")
    }
}

enum Flow {
    Continue,
    Close(CloseReason),
}

pub(crate) struct ClientSession<S> {
    id: SessionId,
    identity: ClientIdentity,
    state: SessionState,
    stream: S,
    buffer: Vec<u8>,
    read_timeout: Option<Duration>,
    context: Arc<ServerContext>,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(
        context: Arc<ServerContext>,
        stream: S,
        identity: ClientIdentity,
        id: SessionId,
    ) -> Self {
        // Without a secret every request passes validation anyway
        let state = if context.auth().is_enabled() {
            SessionState::Unauthenticated
        } else {
            SessionState::Authenticated
        };

        Self {
            id,
            identity,
            state,
            stream,
            buffer: vec![0u8; context.config().read_buffer_size],
            read_timeout: context.config().read_timeout(),
            context,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    /// Run the read loop until the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Read`] or [`ServerError::Send`] on transport
    /// failures other than read timeouts.
    pub(crate) async fn run(&mut self) -> Result<CloseReason, ServerError> {
        loop {
            let Some(message) = self.read_message().await? else {
                self.state = SessionState::Closed;
                return Ok(CloseReason::Disconnected);
            };

            trace!("Received from {}: {message:?}", self.identity);

            if let Flow::Close(reason) = self.handle_message(&message).await? {
                self.state = SessionState::Closed;
                return Ok(reason);
            }
        }
    }

    async fn handle_message(&mut self, message: &str) -> Result<Flow, ServerError> {
        match self.state {
            SessionState::Unauthenticated => self.handle_handshake(message).await,
            SessionState::Authenticated => self.handle_request(message).await,
            SessionState::Closed => Ok(Flow::Close(CloseReason::ClosedByServer)),
        }
    }

    async fn handle_handshake(&mut self, message: &str) -> Result<Flow, ServerError> {
        if message != AUTH_REQUEST {
            warn!(
                "Client {} sent a request before authenticating, closing",
                self.identity
            );
            self.send(AUTH_REQUIRED).await?;
            return Ok(Flow::Close(CloseReason::AuthRequired));
        }

        if self.context.auth().authenticate(self.identity).await {
            self.send(AUTH_SUCCESS).await?;
            self.state = SessionState::Authenticated;
            Ok(Flow::Continue)
        } else {
            warn!("Authentication failed for {}", self.identity);
            self.send(AUTH_FAILED).await?;
            Ok(Flow::Close(CloseReason::AuthFailed))
        }
    }

    async fn handle_request(&mut self, message: &str) -> Result<Flow, ServerError> {
        // Without a secret the handshake is optional but still answered.
        // With one, a repeated handshake is classified like any other request.
        if message == AUTH_REQUEST && !self.context.auth().is_enabled() {
            self.send(AUTH_SUCCESS).await?;
            return Ok(Flow::Continue);
        }

        let Some(unwrapped) = self.context.auth().validate(&self.identity, message).await else {
            self.send(INVALID_TOKEN).await?;
            return Ok(Flow::Continue);
        };

        let request = match Request::parse(&unwrapped) {
            Ok(request) => request,
            Err(e) => {
                warn!("Protocol error from {}: {e}", self.identity);
                self.send(INVALID_REQUEST).await?;
                return Ok(Flow::Continue);
            }
        };

        let response = self
            .context
            .dispatcher()
            .dispatch(&self.identity, &request)
            .await;
        self.send(&response).await?;

        if request.closes_session() {
            Ok(Flow::Close(CloseReason::StopRequested))
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Read one message. `None` means the peer disconnected.
    async fn read_message(&mut self) -> Result<Option<String>, ServerError> {
        loop {
            let read = match self.read_timeout {
                Some(limit) => match TokioTimeout(limit, self.stream.read(&mut self.buffer)).await
                {
                    Ok(read) => read,
                    Err(_) => {
                        trace!("Read from {} timed out, retrying", self.identity);
                        continue;
                    }
                },
                None => self.stream.read(&mut self.buffer).await,
            };

            match read {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    return Ok(Some(
                        String::from_utf8_lossy(&self.buffer[..n]).into_owned(),
                    ));
                }
                Err(e) if is_retryable(e.kind()) => {
                    trace!("Transient read error from {}: {e}", self.identity);
                    continue;
                }
                Err(e) => {
                    return Err(ServerError::Read {
                        message: format!("Failed to read from {}: {e}", self.identity),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }
    }

    async fn send(&mut self, response: &str) -> Result<(), ServerError> {
        self.stream
            .write_all(response.as_bytes())
            .await
            .map_err(|e| ServerError::Send {
                message: format!("Failed to send response to {}: {e}", self.identity),
                location: ErrorLocation::from(Location::caller()),
            })?;
        trace!("Sent to {}: {response:?}", self.identity);
        Ok(())
    }

    /// Close the connection. Errors are irrelevant at this point.
    async fn close(&mut self) {
        self.state = SessionState::Closed;
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of connection {} failed: {e}", self.id);
        }
    }
}

fn is_retryable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// Drive one registered connection to completion and clean up after it.
///
/// The session ends on its own (EOF, `Stop`, auth failure, transport error)
/// or when its [`SessionLease`] is signalled. Either way the connection is
/// closed, the identity's authentication purged and the registry entry
/// removed before the lease is released.
pub(crate) async fn serve_connection<S>(
    context: Arc<ServerContext>,
    stream: S,
    identity: ClientIdentity,
    id: SessionId,
    lease: SessionLease,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut session = ClientSession::new(Arc::clone(&context), stream, identity, id);

    let reason = tokio::select! {
        outcome = session.run() => match outcome {
            Ok(reason) => reason,
            Err(e) => {
                error!("Session {id} for {identity} aborted: {e}");
                CloseReason::TransportError
            }
        },
        _ = lease.closed() => CloseReason::ClosedByServer,
    };

    session.close().await;
    drop(session);

    // Purge first: once the entry is gone a replacement may register and authenticate
    context.auth().purge(&identity).await;
    context.registry().remove(&identity, id).await;

    info!("Closing connection from {identity} (session {id}): {reason}");
    drop(lease);
}
