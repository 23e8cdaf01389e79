//! Listener and accept loop.

use crate::auth::AuthGateway;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::server::ServerError;
use crate::identity::ClientIdentity;
use crate::server::context::ServerContext;
use crate::server::dispatcher::RequestDispatcher;
use crate::server::handle::ServerHandle;
use crate::server::registry::SessionHandle;
use crate::server::session::serve_connection;

use common::ErrorLocation;

use std::io::Error as IoError;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket};
use tokio::spawn as TokioSpawn;
use tokio::sync::oneshot;
use tokio::time::sleep as TokioSleep;

const ACCEPT_RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(10);
const ACCEPT_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(1);

/// Starts the dialogue server.
///
/// Binds `config.host:config.port` with address reuse enabled and spawns the
/// accept loop in the background. Every accepted connection gets its own
/// session task; a connection from an identity that already has a session
/// replaces it.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the config is invalid or the address
/// cannot be bound. This is the only fatal server error.
pub async fn start_server<E: Engine>(
    config: ServerConfig,
    auth: AuthGateway,
    engine: E,
) -> Result<ServerHandle, ServerError> {
    config.validate().map_err(|e| ServerError::Bind {
        message: format!("Invalid server config: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let listener = bind_listener(&config)?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| bind_error("Failed to read bound address", e))?;

    info!(
        "Dialogue server listening on {} (authentication {})",
        local_addr,
        if auth.is_enabled() { "enabled" } else { "disabled" }
    );

    let context = Arc::new(ServerContext::new(
        config,
        auth,
        RequestDispatcher::new(engine),
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = TokioSpawn(accept_loop(listener, Arc::clone(&context), shutdown_rx));

    Ok(ServerHandle::new(local_addr, context, shutdown_tx, task))
}

fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let address: SocketAddr = config.bind_address().parse().map_err(|e| ServerError::Bind {
        message: format!("Invalid bind address {}: {e}", config.bind_address()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let socket = if address.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|e| bind_error(&format!("Failed to create socket for {address}"), e))?;

    // Restarting must not fail on a socket lingering from the previous run
    socket
        .set_reuseaddr(true)
        .map_err(|e| bind_error(&format!("Failed to enable address reuse on {address}"), e))?;

    socket
        .bind(address)
        .map_err(|e| bind_error(&format!("Failed to bind {address}"), e))?;

    socket
        .listen(config.listen_backlog)
        .map_err(|e| bind_error(&format!("Failed to listen on {address}"), e))
}

/// Every failure while setting up the listener is fatal and reported as
/// [`ServerError::Bind`].
#[track_caller]
pub(crate) fn bind_error(context: &str, error: IoError) -> ServerError {
    ServerError::Bind {
        message: format!("{context}: {error}"),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Delay policy after failed accepts. Never gives up; reset after a success.
pub(crate) fn accept_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: ACCEPT_RETRY_INITIAL_INTERVAL,
        max_interval: ACCEPT_RETRY_MAX_INTERVAL,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Accept until shutdown is requested (or the handle is dropped), then close
/// all sessions and finally the listener.
async fn accept_loop(
    listener: TcpListener,
    context: Arc<ServerContext>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut backoff = accept_backoff();

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    backoff.reset();
                    admit(&context, stream, addr).await;
                }
                Err(e) => {
                    let delay = backoff.next_backoff().unwrap_or(ACCEPT_RETRY_MAX_INTERVAL);
                    error!("Failed to accept connection, retrying after {delay:?}: {e}");
                    // Errors like EMFILE persist; stay responsive to shutdown while waiting
                    tokio::select! {
                        _ = &mut shutdown_rx => {
                            info!("Shutdown requested, no longer accepting connections");
                            break;
                        }
                        _ = TokioSleep(delay) => {}
                    }
                }
            }
        }
    }

    let closed = context.registry().close_all().await;
    info!("Closed {closed} session(s)");

    drop(listener);
    info!("Listener closed");
}

/// Register and spawn a session for a freshly accepted connection.
///
/// An existing session for the same identity is closed and removed first, so
/// the two are never registered at the same time.
pub(crate) async fn admit<S>(context: &Arc<ServerContext>, stream: S, addr: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let identity = ClientIdentity::from(addr);

    if let Some(evicted) = context.registry().evict(&identity).await {
        warn!("Evicted session {evicted} for {identity} in favour of a new connection");
    }

    let (handle, lease) = SessionHandle::pair();
    let id = handle.id();

    if let Some(displaced) = context.registry().register(identity, handle).await {
        // Only the accept loop registers, so this means a bug elsewhere
        warn!(
            "Session {} for {identity} was still registered, closing it",
            displaced.id()
        );
        displaced.close().await;
    }

    info!("Connection from {identity} (session {id})");
    TokioSpawn(serve_connection(
        Arc::clone(context),
        stream,
        identity,
        id,
        lease,
    ));
}
