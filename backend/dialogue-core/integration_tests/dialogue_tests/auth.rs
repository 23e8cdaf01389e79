#![cfg(unix)]

use crate::dialogue_tests::helpers::{
    TEST_SECRET, connect, read_response, request, spawn_auth_peer, start_test_server,
};

use dialogue_core::auth::AuthGateway;
use dialogue_core::engine::EchoEngine;
use dialogue_core::protocol::{AUTH_REQUEST, AUTH_REQUIRED, AUTH_SUCCESS, is_error_response};

use std::time::Duration;

/// **VALUE**: Verifies that a secret fetched from the auth peer enables the handshake.
///
/// **WHY THIS MATTERS**: This is how the trusted parent process turns on
/// authentication for the server it launched.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The gateway does not talk to the peer at startup
/// - Requests are served before the handshake
/// - Enveloped requests are not unwrapped after the handshake
#[tokio::test]
async fn given_auth_peer_when_server_started_then_handshake_required() {
    // GIVEN: A server whose secret came from the auth peer
    let (_dir, channel) = spawn_auth_peer(TEST_SECRET);
    let auth = AuthGateway::connect(Some(&channel), Duration::from_secs(2)).await;
    assert!(auth.is_enabled());
    let handle = start_test_server(auth, EchoEngine).await;
    assert!(handle.auth_enabled());

    // WHEN: A client skips the handshake
    let mut rude = connect(handle.local_addr()).await;
    let rejected = request(&mut rude, "GetData").await;

    // THEN: It is told to authenticate and disconnected
    assert_eq!(rejected, AUTH_REQUIRED);
    assert_eq!(read_response(&mut rude).await, "");

    // WHEN: A client performs the handshake
    let mut polite = connect(handle.local_addr()).await;
    let handshake = request(&mut polite, AUTH_REQUEST).await;
    let response = request(&mut polite, "TOKEN:abc|SESSION:def|Invoke:::hi").await;

    // THEN: Its enveloped request is served
    assert_eq!(handshake, AUTH_SUCCESS);
    assert!(!is_error_response(&handshake));
    assert_eq!(response, "Echo: hi");

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies fail-open startup when the peer never answers.
///
/// **BUG THIS CATCHES**: Would catch startup hanging on, or failing because of,
/// a missing auth peer.
#[tokio::test]
async fn given_missing_auth_peer_when_server_started_then_auth_disabled() {
    let dir = tempfile::TempDir::new().unwrap();
    let channel = dir.path().join("missing.sock");

    let auth = AuthGateway::connect(channel.to_str(), Duration::from_millis(200)).await;
    let handle = start_test_server(auth, EchoEngine).await;
    let mut client = connect(handle.local_addr()).await;

    assert!(!handle.auth_enabled());
    assert_eq!(request(&mut client, "Invoke:::open").await, "Echo: open");

    handle.shutdown().await.expect("Shutdown failed");
}
