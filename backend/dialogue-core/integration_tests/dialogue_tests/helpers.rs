//! Test helpers for dialogue server integration tests.
//!
//! This module provides utilities for testing the server over real TCP:
//! - Starting a server on an ephemeral loopback port
//! - Sending requests and reading single-read responses
//! - A fake auth peer serving the shared secret

use dialogue_core::auth::AuthGateway;
use dialogue_core::config::ServerConfig;
use dialogue_core::engine::Engine;
use dialogue_core::server::{ServerHandle, start_server};

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

/// Secret served by the fake auth peer.
pub const TEST_SECRET: &str = "integration-secret";

/// Upper bound for any single response in these tests.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Test helper: Start a server on an ephemeral port.
pub async fn start_test_server<E: Engine>(auth: AuthGateway, engine: E) -> ServerHandle {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    start_test_server_with(config, auth, engine).await
}

/// Test helper: Start a server with an explicit config.
pub async fn start_test_server_with<E: Engine>(
    config: ServerConfig,
    auth: AuthGateway,
    engine: E,
) -> ServerHandle {
    start_server(config, auth, engine)
        .await
        .expect("Failed to start dialogue server")
}

/// Test helper: Open a client connection.
pub async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr)
        .await
        .expect("Failed to connect to dialogue server")
}

/// Test helper: Send one request and read one response.
pub async fn request(stream: &mut TcpStream, message: &str) -> String {
    stream
        .write_all(message.as_bytes())
        .await
        .expect("Failed to send request");
    read_response(stream).await
}

/// Test helper: Read one response. An empty string means the server closed
/// the connection.
pub async fn read_response(stream: &mut TcpStream) -> String {
    let mut buffer = vec![0u8; 4096];
    let read = timeout(RESPONSE_TIMEOUT, stream.read(&mut buffer))
        .await
        .expect("Timed out waiting for a response")
        // A reset counts as closed
        .unwrap_or(0);
    String::from_utf8_lossy(&buffer[..read]).into_owned()
}

/// Test helper: Wait until nothing accepts connections on `addr`.
pub async fn wait_until_refused(addr: SocketAddr) -> bool {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_err() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Test helper: Fake auth peer on a Unix socket. Answers every request with
/// `secret`. Returns the socket path; keep the `TempDir` alive.
#[cfg(unix)]
pub fn spawn_auth_peer(secret: &'static str) -> (tempfile::TempDir, String) {
    use tokio::net::UnixListener;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("auth-peer.sock");
    let listener = UnixListener::bind(&path).expect("Failed to bind auth peer socket");

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buffer = [0u8; 64];
            let _ = stream.read(&mut buffer).await;
            let _ = stream.write_all(secret.as_bytes()).await;
        }
    });

    let path = path.to_str().expect("Non UTF-8 temp path").to_string();
    (dir, path)
}
