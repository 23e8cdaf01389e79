//! Maps requests to engine calls, one call at a time.

use crate::engine::Engine;
use crate::error::engine::EngineError;
use crate::identity::ClientIdentity;
use crate::protocol::{ENGINE_FAILURE, FETCH_PROMPT, INVALID_REQUEST, Request, STOP_ACKNOWLEDGEMENT};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

/// Owns the engine and the exclusive section around it.
///
/// Every engine call, from every session, goes through one mutex. Waiters are
/// served in arrival order.
pub struct RequestDispatcher {
    engine: Arc<Mutex<Box<dyn Engine>>>,
}

impl RequestDispatcher {
    pub fn new<E: Engine>(engine: E) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    pub fn from_boxed(engine: Box<dyn Engine>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Handle one request and produce the response text.
    ///
    /// Engine failures are logged and answered with [`ENGINE_FAILURE`]; they
    /// never propagate to the session.
    pub async fn dispatch(&self, identity: &ClientIdentity, request: &Request) -> String {
        let outcome = match request {
            Request::Fetch => {
                info!("Fetch request from {identity}");
                self.invoke(FETCH_PROMPT.to_string(), None).await
            }
            Request::Stop => {
                info!("Stop request from {identity}");
                return STOP_ACKNOWLEDGEMENT.to_string();
            }
            Request::Invoke { text, context } => {
                info!(
                    "Invoke request from {identity} ({} chars, context: {})",
                    text.len(),
                    context.is_some()
                );
                self.invoke(text.clone(), context.clone()).await
            }
            Request::Unknown => {
                debug!("Unknown request from {identity}");
                return INVALID_REQUEST.to_string();
            }
        };

        match outcome {
            Ok(response) => response,
            Err(e) => {
                error!("Engine failed for {identity}: {e}");
                ENGINE_FAILURE.to_string()
            }
        }
    }

    /// Run the engine inside the exclusive section.
    ///
    /// The guard moves into the blocking task, so the section stays held until
    /// the engine returns even if the waiting session goes away.
    async fn invoke(&self, text: String, context: Option<String>) -> Result<String, EngineError> {
        let mut engine = Arc::clone(&self.engine).lock_owned().await;

        spawn_blocking(move || engine.invoke(&text, context.as_deref()))
            .await
            .map_err(|e| EngineError::Panicked {
                message: format!("Engine task failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?
    }
}
