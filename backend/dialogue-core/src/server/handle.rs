//! Handle to a running server.

use crate::error::server::ServerError;
use crate::server::context::ServerContext;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use log::info;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a running dialogue server.
///
/// Returned by [`start_server`](crate::server::start_server). The server runs
/// in a background task until [`ServerHandle::shutdown`] is called or the
/// handle is dropped; either way the shutdown sequence closes every session
/// before the listener.
///
/// # Examples
///
/// ```no_run
/// use dialogue_core::auth::AuthGateway;
/// use dialogue_core::config::ServerConfig;
/// use dialogue_core::engine::EchoEngine;
/// use dialogue_core::server::start_server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = start_server(ServerConfig::default(), AuthGateway::disabled(), EchoEngine).await?;
///     tokio::signal::ctrl_c().await?;
///     handle.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    local_addr: SocketAddr,
    context: Arc<ServerContext>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        context: Arc<ServerContext>,
        shutdown_tx: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            local_addr,
            context,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Address the listener is bound to (resolves port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn auth_enabled(&self) -> bool {
        self.context.auth().is_enabled()
    }

    /// Number of currently registered sessions.
    pub async fn session_count(&self) -> usize {
        self.context.registry().len().await
    }

    /// Stop accepting, close every session, then close the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Shutdown`] if the accept task panicked.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        info!("Shutting down server on {}", self.local_addr);

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // Err means the accept loop already ended
            let _ = shutdown_tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.await.map_err(|e| ServerError::Shutdown {
                message: format!("Accept loop failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        Ok(())
    }
}
