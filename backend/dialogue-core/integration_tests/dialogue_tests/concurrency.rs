use crate::dialogue_tests::helpers::{connect, request, start_test_server};

use dialogue_core::auth::AuthGateway;
use dialogue_core::error::engine::EngineError;

use common::RedactedSecret;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use dialogue_core::protocol::{AUTH_REQUEST, AUTH_SUCCESS};

/// **VALUE**: Verifies that engine calls from different connections never overlap.
///
/// **WHY THIS MATTERS**: The engine is stateful and not reentrant.
///
/// **BUG THIS CATCHES**: Would catch a per-session engine lock, or none at all.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_many_clients_when_invoking_concurrently_then_engine_calls_serialized() {
    // GIVEN: A slow engine that records its peak concurrency
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let engine = {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        move |text: &str, _: Option<&str>| -> Result<String, EngineError> {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(25));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("done:{text}"))
        }
    };
    let handle = start_test_server(AuthGateway::disabled(), engine).await;
    let addr = handle.local_addr();

    // WHEN: Six clients invoke at once
    let clients: Vec<_> = (0..6)
        .map(|n| {
            tokio::spawn(async move {
                let mut client = connect(addr).await;
                request(&mut client, &format!("Invoke:::{n}")).await
            })
        })
        .collect();

    // THEN: Every client got its own answer, one engine call at a time
    for (n, client) in clients.into_iter().enumerate() {
        assert_eq!(client.await.unwrap(), format!("done:{n}"));
    }
    assert_eq!(peak.load(Ordering::SeqCst), 1);

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies that a long engine call does not block other clients' handshakes.
///
/// **WHY THIS MATTERS**: Only engine calls are serialized. Connecting and
/// authenticating must stay responsive.
///
/// **BUG THIS CATCHES**: Would catch the engine lock being held around the
/// whole request handling path.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_slow_engine_call_when_other_client_handshakes_then_not_blocked() {
    // GIVEN: A secured server whose engine takes 500ms
    let engine = |text: &str, _: Option<&str>| -> Result<String, EngineError> {
        sleep(Duration::from_millis(500));
        Ok(text.to_string())
    };
    let auth = AuthGateway::with_secret(RedactedSecret::new(String::from("s3cret")));
    let handle = start_test_server(auth, engine).await;
    let addr = handle.local_addr();

    let mut busy = connect(addr).await;
    assert_eq!(request(&mut busy, AUTH_REQUEST).await, AUTH_SUCCESS);
    let slow_call = tokio::spawn(async move { request(&mut busy, "Invoke:::slow").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // WHEN: Another client handshakes while the engine is busy
    let started = Instant::now();
    let mut other = connect(addr).await;
    let handshake = request(&mut other, AUTH_REQUEST).await;

    // THEN: The handshake completes well before the engine call
    assert_eq!(handshake, AUTH_SUCCESS);
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "Handshake took {:?}",
        started.elapsed()
    );
    assert_eq!(slow_call.await.unwrap(), "slow");

    handle.shutdown().await.expect("Shutdown failed");
}

/// **VALUE**: Verifies in-order processing within a session.
///
/// **BUG THIS CATCHES**: Would catch requests from one client being handled
/// out of order.
#[tokio::test]
async fn given_sequential_requests_when_served_then_engine_sees_them_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = {
        let seen = Arc::clone(&seen);
        move |text: &str, _: Option<&str>| -> Result<String, EngineError> {
            seen.lock().unwrap().push(text.to_string());
            Ok(text.to_string())
        }
    };
    let handle = start_test_server(AuthGateway::disabled(), engine).await;
    let mut client = connect(handle.local_addr()).await;

    for n in 0..5 {
        assert_eq!(
            request(&mut client, &format!("Invoke:::{n}")).await,
            n.to_string()
        );
    }

    assert_eq!(*seen.lock().unwrap(), vec!["0", "1", "2", "3", "4"]);
    handle.shutdown().await.expect("Shutdown failed");
}
