use crate::dialogue_tests::helpers::{
    connect, read_response, request, start_test_server, start_test_server_with,
    wait_until_refused,
};

use dialogue_core::auth::AuthGateway;
use dialogue_core::config::ServerConfig;
use dialogue_core::engine::EchoEngine;
use dialogue_core::error::server::ServerError;
use dialogue_core::server::start_server;

use tokio::net::TcpListener;

/// **VALUE**: Verifies the shutdown order: sessions closed, then the listener.
///
/// **WHY THIS MATTERS**: Clients must see their connection end, and no new
/// connection may slip in during teardown.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Live sessions survive shutdown
/// - The listener keeps accepting after shutdown
#[tokio::test]
async fn given_connected_clients_when_shutdown_then_sessions_and_listener_closed() {
    // GIVEN: Two live sessions
    let handle = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    let addr = handle.local_addr();
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    assert_eq!(request(&mut first, "Invoke:::a").await, "Echo: a");
    assert_eq!(request(&mut second, "Invoke:::b").await, "Echo: b");
    assert_eq!(handle.session_count().await, 2);

    // WHEN: Shutting down
    handle.shutdown().await.expect("Shutdown failed");

    // THEN: Both clients are disconnected and the port refuses connections
    assert_eq!(read_response(&mut first).await, "");
    assert_eq!(read_response(&mut second).await, "");
    assert!(wait_until_refused(addr).await);
}

/// **VALUE**: Verifies that the server can restart on the same port right away.
///
/// **WHY THIS MATTERS**: The port is fixed and well known; a restart must not
/// fail on a socket left over from the previous run.
///
/// **BUG THIS CATCHES**: Would catch a missing address-reuse option.
#[tokio::test]
async fn given_stopped_server_when_restarted_on_same_port_then_binds() {
    // GIVEN: A server that served a client and was shut down
    let first = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    let port = first.local_addr().port();
    let mut client = connect(first.local_addr()).await;
    assert_eq!(request(&mut client, "Stop").await, "Server stopping...");
    first.shutdown().await.expect("Shutdown failed");

    // WHEN: Starting again on the same port
    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };
    let second = start_test_server_with(config, AuthGateway::disabled(), EchoEngine).await;

    // THEN: It binds and serves
    assert_eq!(second.local_addr().port(), port);
    let mut client = connect(second.local_addr()).await;
    assert_eq!(request(&mut client, "Invoke:::back").await, "Echo: back");
    second.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies that dropping the handle stops the server.
///
/// **BUG THIS CATCHES**: Would catch a leaked accept loop when the owner goes away.
#[tokio::test]
async fn given_running_server_when_handle_dropped_then_listener_closed() {
    let handle = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    let addr = handle.local_addr();

    drop(handle);

    assert!(wait_until_refused(addr).await);
}

/// **VALUE**: Verifies that bind failures are reported as fatal errors.
///
/// **BUG THIS CATCHES**: Would catch the server silently running without a listener.
#[tokio::test]
async fn given_port_in_use_when_starting_then_bind_error() {
    // GIVEN: Another listener occupying a port
    let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = holder.local_addr().unwrap().port();

    // WHEN: Starting on that port
    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };
    let result = start_server(config, AuthGateway::disabled(), EchoEngine).await;

    // THEN: Bind error
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}

/// **VALUE**: Verifies that an invalid config is rejected before binding.
#[tokio::test]
async fn given_invalid_config_when_starting_then_bind_error() {
    let config = ServerConfig {
        host: String::from("10.0.0.1"),
        ..ServerConfig::default()
    };

    let result = start_server(config, AuthGateway::disabled(), EchoEngine).await;

    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
