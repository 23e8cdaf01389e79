// Unit tests for request classification

use crate::error::protocol::ProtocolError;
use crate::protocol::{Request, is_error_response};

/// **VALUE**: Verifies the exact-match commands.
///
/// **WHY THIS MATTERS**: `GetData` and `Stop` are matched exactly; anything that
/// merely contains them must not trigger a fetch or close the connection.
///
/// **BUG THIS CATCHES**: Would catch a `contains`/`starts_with` match or trimming
/// that makes `"Stop "` close a session.
#[test]
fn given_exact_commands_when_parsed_then_classified() {
    assert_eq!(Request::parse("GetData").unwrap(), Request::Fetch);
    assert_eq!(Request::parse("Stop").unwrap(), Request::Stop);
    assert_eq!(Request::parse("Stop ").unwrap(), Request::Unknown);
    assert_eq!(Request::parse("getdata").unwrap(), Request::Unknown);
}

/// **VALUE**: Verifies invoke parsing without context.
///
/// **WHY THIS MATTERS**: This is the main request type clients send.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the segment index.
#[test]
fn given_invoke_without_context_when_parsed_then_text_only() {
    // WHEN: Parsing a plain invoke
    let request = Request::parse("Invoke:::hello").unwrap();

    // THEN: Text is segment 1, no context
    assert_eq!(
        request,
        Request::Invoke {
            text: String::from("hello"),
            context: None,
        }
    );
}

/// **VALUE**: Verifies invoke parsing with context.
///
/// **WHY THIS MATTERS**: Conversation history travels in the context segment;
/// losing it makes every reply context-free.
///
/// **BUG THIS CATCHES**: Would catch reading the context from segment 2 (the
/// literal `Context` label) instead of segment 3.
#[test]
fn given_invoke_with_context_when_parsed_then_text_and_context() {
    let request = Request::parse("Invoke:::hello:::Context:::prior").unwrap();

    assert_eq!(
        request,
        Request::Invoke {
            text: String::from("hello"),
            context: Some(String::from("prior")),
        }
    );
}

/// **VALUE**: Verifies that the invoke marker is found anywhere in the message.
///
/// **WHY THIS MATTERS**: Clients prefix invoke messages (e.g. with an NPC name)
/// and rely on substring matching.
///
/// **BUG THIS CATCHES**: Would catch a `starts_with` check.
#[test]
fn given_prefixed_invoke_when_parsed_then_still_invoke() {
    let request = Request::parse("npc-7 Invoke:::hi there").unwrap();

    assert_eq!(
        request,
        Request::Invoke {
            text: String::from("hi there"),
            context: None,
        }
    );
}

/// **VALUE**: Verifies that a context marker without a context segment is a protocol error.
///
/// **WHY THIS MATTERS**: Malformed requests must be answered with `Invalid request`
/// instead of panicking on an out-of-range index.
///
/// **BUG THIS CATCHES**: Would catch direct indexing (`segments[3]`).
#[test]
fn given_truncated_context_when_parsed_then_malformed_error() {
    let result = Request::parse("Invoke:::Context:::");

    assert!(
        matches!(result, Err(ProtocolError::MalformedInvoke { .. })),
        "Expected MalformedInvoke, got {result:?}"
    );
}

/// **VALUE**: Verifies that anything else is `Unknown` and only `Stop` closes.
///
/// **BUG THIS CATCHES**: Would catch `closes_session` returning true for other requests.
#[test]
fn given_other_text_when_parsed_then_unknown() {
    let request = Request::parse("hello world").unwrap();

    assert_eq!(request, Request::Unknown);
    assert!(!request.closes_session());
    assert!(Request::Stop.closes_session());
    assert!(!Request::Fetch.closes_session());
}

/// **VALUE**: Verifies the client-side failure check.
///
/// **BUG THIS CATCHES**: Would catch a normal reply being flagged as failure.
#[test]
fn given_responses_when_checked_then_failures_detected() {
    assert!(is_error_response(""));
    assert!(is_error_response("AUTH_FAILED"));
    assert!(is_error_response("INVALID_TOKEN"));
    assert!(!is_error_response("Echo: hello"));
}
