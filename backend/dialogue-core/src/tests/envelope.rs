// Unit tests for the token envelope

use crate::auth::envelope::Envelope;
use crate::tests::support::wrap_envelope;

/// **VALUE**: Verifies that a well-formed envelope splits into its three fields.
///
/// **WHY THIS MATTERS**: Authenticated clients wrap every request; the payload is
/// what gets classified.
///
/// **BUG THIS CATCHES**: Would catch the `SESSION:` prefix leaking into the session field.
#[test]
fn given_envelope_when_parsed_then_fields_extracted() {
    let envelope = Envelope::parse("TOKEN:abc|SESSION:key1|Invoke:::hi").unwrap();

    assert_eq!(envelope.token, "abc");
    assert_eq!(envelope.session, "key1");
    assert_eq!(envelope.payload, "Invoke:::hi");
}

/// **VALUE**: Verifies that `|` inside the payload is preserved.
///
/// **WHY THIS MATTERS**: Dialogue text and context are free-form and may contain pipes.
///
/// **BUG THIS CATCHES**: Would catch `split('|')` instead of `splitn(3, '|')`.
#[test]
fn given_payload_with_pipes_when_parsed_then_payload_intact() {
    let envelope = Envelope::parse("TOKEN:t|SESSION:s|Invoke:::a|b|c").unwrap();

    assert_eq!(envelope.payload, "Invoke:::a|b|c");
}

/// **VALUE**: Verifies that non-envelope shapes are rejected.
///
/// **WHY THIS MATTERS**: The gateway falls back to passing the raw message through;
/// a partial match must not strip anything.
///
/// **BUG THIS CATCHES**: Would catch accepting a missing `SESSION:` prefix or payload.
#[test]
fn given_malformed_envelopes_when_parsed_then_none() {
    assert!(Envelope::parse("GetData").is_none());
    assert!(Envelope::parse("TOKEN:abc|key1|GetData").is_none());
    assert!(Envelope::parse("TOKEN:abc|SESSION:key1").is_none());
    assert!(Envelope::parse("SESSION:key1|TOKEN:abc|GetData").is_none());
}

/// **VALUE**: Verifies that the client-side wire form is what `parse` accepts.
///
/// **BUG THIS CATCHES**: Would catch a delimiter mismatch between client and server helpers.
#[test]
fn given_wrapped_request_when_parsed_then_payload_matches() {
    let wire = wrap_envelope("tok", "sess", "GetData");

    assert_eq!(wire, "TOKEN:tok|SESSION:sess|GetData");
    assert_eq!(Envelope::parse(&wire).unwrap().payload, "GetData");
}
