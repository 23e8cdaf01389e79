// Shared fixtures for unit tests

use crate::auth::AuthGateway;
use crate::auth::envelope::{FIELD_DELIMITER, SESSION_PREFIX, TOKEN_PREFIX};
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::engine::EngineError;
use crate::identity::ClientIdentity;
use crate::server::{RequestDispatcher, ServerContext};

use common::RedactedSecret;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub(crate) const TEST_SECRET: &str = "test-shared-secret";

/// A loopback identity with the given port.
pub(crate) fn identity(port: u16) -> ClientIdentity {
    ClientIdentity::from(SocketAddr::from(([127, 0, 0, 1], port)))
}

pub(crate) fn secured_gateway() -> AuthGateway {
    AuthGateway::with_secret(RedactedSecret::new(String::from(TEST_SECRET)))
}

pub(crate) fn context<E: Engine>(auth: AuthGateway, engine: E) -> Arc<ServerContext> {
    Arc::new(ServerContext::new(
        ServerConfig::default(),
        auth,
        RequestDispatcher::new(engine),
    ))
}

/// Calls the engine received, in order.
pub(crate) type CallLog = Arc<Mutex<Vec<(String, Option<String>)>>>;

/// Engine that records every call and answers `reply:<text>`.
pub(crate) fn recording_engine() -> (impl Engine, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);

    let engine = move |text: &str, context: Option<&str>| -> Result<String, EngineError> {
        log.lock()
            .unwrap()
            .push((text.to_string(), context.map(str::to_string)));
        Ok(format!("reply:{text}"))
    };

    (engine, calls)
}

/// Write one message and read one response.
pub(crate) async fn exchange(client: &mut DuplexStream, message: &str) -> String {
    client
        .write_all(message.as_bytes())
        .await
        .expect("Failed to write request");
    read_response(client).await
}

/// Read one response; empty string means the server closed the stream.
pub(crate) async fn read_response(client: &mut DuplexStream) -> String {
    let mut buffer = vec![0u8; 4096];
    let read = client
        .read(&mut buffer)
        .await
        .expect("Failed to read response");
    String::from_utf8_lossy(&buffer[..read]).into_owned()
}

/// Client-side wire form of an enveloped request.
pub(crate) fn wrap_envelope(token: &str, session: &str, payload: &str) -> String {
    format!("{TOKEN_PREFIX}{token}{FIELD_DELIMITER}{SESSION_PREFIX}{session}{FIELD_DELIMITER}{payload}")
}
