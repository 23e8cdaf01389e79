use crate::dialogue_tests::helpers::{connect, read_response, request, start_test_server};

use dialogue_core::auth::AuthGateway;
use dialogue_core::engine::EchoEngine;
use dialogue_core::protocol::{
    AUTH_REQUEST, AUTH_SUCCESS, FETCH_PROMPT, INVALID_REQUEST, STOP_ACKNOWLEDGEMENT,
    is_error_response,
};

/// **VALUE**: Verifies the request kinds end to end over TCP.
///
/// **WHY THIS MATTERS**: This is the full surface a client without
/// authentication uses.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `GetData` does not reach the engine with the fixed prompt
/// - Invoke text or context is mangled on the way to the engine
/// - Unknown requests close the connection instead of being answered
#[tokio::test]
async fn given_running_server_when_sending_requests_then_each_gets_its_response() {
    // GIVEN: A server with the echo engine and no authentication
    let handle = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    assert!(!handle.auth_enabled());
    let mut client = connect(handle.local_addr()).await;

    // WHEN/THEN: Every request gets its own response on the same connection
    assert_eq!(
        request(&mut client, "GetData").await,
        format!("Echo: {FETCH_PROMPT}")
    );
    assert_eq!(request(&mut client, "Invoke:::hello").await, "Echo: hello");
    assert_eq!(
        request(&mut client, "Invoke:::hello:::Context:::we met").await,
        "Echo with context [we met]: hello"
    );
    assert_eq!(request(&mut client, "Hello there").await, INVALID_REQUEST);
    assert_eq!(request(&mut client, "Invoke:::Context:::").await, INVALID_REQUEST);

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies that `Stop` is acknowledged and ends only that connection.
///
/// **BUG THIS CATCHES**: Would catch `Stop` shutting down the whole server, or
/// the connection staying open after the acknowledgement.
#[tokio::test]
async fn given_connected_client_when_stop_sent_then_acknowledged_and_closed() {
    // GIVEN: Two connected clients
    let handle = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    let mut stopping = connect(handle.local_addr()).await;
    let mut staying = connect(handle.local_addr()).await;
    assert_eq!(request(&mut staying, "Invoke:::x").await, "Echo: x");

    // WHEN: One sends Stop
    let ack = request(&mut stopping, "Stop").await;

    // THEN: It is acknowledged and closed, the other is unaffected
    assert_eq!(ack, STOP_ACKNOWLEDGEMENT);
    assert_eq!(read_response(&mut stopping).await, "");
    assert_eq!(request(&mut staying, "Invoke:::y").await, "Echo: y");

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies that the handshake is honoured without a secret.
///
/// **BUG THIS CATCHES**: Would catch clients that always handshake breaking
/// against a server without authentication.
#[tokio::test]
async fn given_no_secret_when_handshaking_then_success_and_requests_served() {
    let handle = start_test_server(AuthGateway::disabled(), EchoEngine).await;
    let mut client = connect(handle.local_addr()).await;

    let handshake = request(&mut client, AUTH_REQUEST).await;
    let response = request(&mut client, "TOKEN:t|SESSION:s|GetData").await;

    assert_eq!(handshake, AUTH_SUCCESS);
    // Without a secret the envelope is not stripped
    assert_eq!(response, INVALID_REQUEST);
    assert!(!is_error_response(&response));

    handle.shutdown().await.expect("Shutdown failed");
}
