// Unit tests for AuthGateway

use crate::auth::AuthGateway;
use crate::tests::support::{identity, secured_gateway};

use std::time::Duration;

/// **VALUE**: Verifies pass-through behaviour without a secret.
///
/// **WHY THIS MATTERS**: When no auth peer is configured the server must behave
/// exactly like the unauthenticated variant.
///
/// **BUG THIS CATCHES**: Would catch `validate()` rejecting or unwrapping messages
/// when authentication is disabled.
#[tokio::test]
async fn given_no_secret_when_validating_then_message_passes_unchanged() {
    // GIVEN: A disabled gateway
    let gateway = AuthGateway::disabled();
    let client = identity(40001);

    // THEN: Everything passes unchanged, nothing is recorded
    assert!(!gateway.is_enabled());
    assert_eq!(
        gateway.validate(&client, "TOKEN:t|SESSION:s|GetData").await,
        Some(String::from("TOKEN:t|SESSION:s|GetData"))
    );
    assert!(gateway.authenticate(client).await);
    assert!(!gateway.is_authenticated(&client).await);
}

/// **VALUE**: Verifies that validation requires a completed handshake.
///
/// **WHY THIS MATTERS**: This is the only gate between unauthenticated peers and
/// the engine when a secret is configured.
///
/// **BUG THIS CATCHES**: Would catch `validate()` ignoring the authenticated set.
#[tokio::test]
async fn given_secret_when_validating_unauthenticated_identity_then_none() {
    let gateway = secured_gateway();

    assert!(gateway.is_enabled());
    assert_eq!(gateway.validate(&identity(40002), "GetData").await, None);
}

/// **VALUE**: Verifies envelope unwrapping and plain pass-through after the handshake.
///
/// **BUG THIS CATCHES**: Would catch the envelope being forwarded unstripped, which
/// would classify every wrapped request as `Invalid request`.
#[tokio::test]
async fn given_authenticated_identity_when_validating_then_envelope_unwrapped() {
    // GIVEN: An authenticated identity
    let gateway = secured_gateway();
    let client = identity(40003);
    assert!(gateway.authenticate(client).await);

    // THEN: Wrapped requests are unwrapped, plain ones pass through
    assert_eq!(
        gateway
            .validate(&client, "TOKEN:abc|SESSION:key|Invoke:::hi")
            .await,
        Some(String::from("Invoke:::hi"))
    );
    assert_eq!(
        gateway.validate(&client, "GetData").await,
        Some(String::from("GetData"))
    );
}

/// **VALUE**: Verifies that purging removes the authentication.
///
/// **WHY THIS MATTERS**: Identities are transport addresses and get reused. A
/// purged identity must handshake again on its next connection.
///
/// **BUG THIS CATCHES**: Would catch stale authentication surviving a session.
#[tokio::test]
async fn given_authenticated_identity_when_purged_then_validation_fails() {
    let gateway = secured_gateway();
    let client = identity(40004);
    gateway.authenticate(client).await;

    gateway.purge(&client).await;

    assert!(!gateway.is_authenticated(&client).await);
    assert_eq!(gateway.validate(&client, "GetData").await, None);
}

/// **VALUE**: Verifies fail-open construction when no channel is given or reachable.
///
/// **WHY THIS MATTERS**: The server must start even if the auth peer is missing.
///
/// **BUG THIS CATCHES**: Would catch `connect()` hanging past its limit or panicking.
#[tokio::test]
async fn given_unreachable_channel_when_connecting_then_auth_disabled() {
    let without_channel = AuthGateway::connect(None, Duration::from_millis(100)).await;
    assert!(!without_channel.is_enabled());

    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("no-peer.sock");
    let unreachable = AuthGateway::connect(
        Some(missing.to_str().unwrap()),
        Duration::from_millis(200),
    )
    .await;
    assert!(!unreachable.is_enabled());
}
