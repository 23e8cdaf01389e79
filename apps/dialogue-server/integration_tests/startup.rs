use dialogue_server::bootstrap::load_config;
use dialogue_server::error::DialogueServerError;

use dialogue_core::auth::AuthGateway;
use dialogue_core::config::ServerConfig;
use dialogue_core::engine::EchoEngine;
use dialogue_core::server::start_server;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// ============================================================================
// Integration tests for startup wiring
// These follow the same path as bootstrap::run, minus the logger and Ctrl-C
// ============================================================================

/// **VALUE**: Tests that a config loaded from disk drives a working server.
///
/// **WHY THIS MATTERS**: This is the closest we get to running the binary:
/// config file, CLI port override, fail-open auth and the echo engine.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The port override is lost between loading and binding
/// - A missing auth channel prevents startup
/// - The default engine is not wired to the dispatcher
#[tokio::test]
async fn given_config_dir_and_port_override_when_started_then_serves_requests() {
    // GIVEN: A config file with a custom buffer size and a port override of 0
    let dir = TempDir::new().unwrap();
    ServerConfig {
        read_buffer_size: 2048,
        ..ServerConfig::default()
    }
    .save(dir.path())
    .unwrap();
    let config = load_config(dir.path(), Some(0)).expect("Config should load");
    assert_eq!(config.read_buffer_size, 2048);

    // WHEN: Starting the way the binary does, without an auth channel
    let auth = AuthGateway::connect(None, config.auth_channel_timeout()).await;
    let handle = start_server(config, auth, EchoEngine)
        .await
        .expect("Server should start");

    // THEN: A client is served without a handshake
    let mut client = TcpStream::connect(handle.local_addr()).await.unwrap();
    client.write_all(b"Invoke:::ping").await.unwrap();
    let mut buffer = [0u8; 256];
    let read = client.read(&mut buffer).await.unwrap();
    assert_eq!(&buffer[..read], b"Echo: ping");

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Tests that a bad config is caught before anything binds.
///
/// **BUG THIS CATCHES**: Would catch an invalid host slipping through to
/// `start_server` and being reported as a bind failure instead.
#[test]
fn given_non_loopback_host_in_file_when_loaded_then_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "host": "192.168.1.10" }"#,
    )
    .unwrap();

    let result = load_config(dir.path(), None);

    assert!(matches!(result, Err(DialogueServerError::Config { .. })));
}
