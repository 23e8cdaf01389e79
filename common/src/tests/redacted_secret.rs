// Unit tests for RedactedSecret
// The secret must never leak through formatting or serialization

use crate::RedactedSecret;

const SECRET: &str = "a1b2c3-very-secret";

/// **VALUE**: Verifies that Debug and Display never print the secret.
///
/// **WHY THIS MATTERS**: The gateway logs its auth state at startup. If the wrapper
/// ever formatted its contents, the shared secret would land in the log file.
///
/// **BUG THIS CATCHES**: Would catch a derived `Debug` replacing the manual impl.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    // GIVEN: A wrapped secret
    let secret = RedactedSecret::new(String::from(SECRET));

    // WHEN: Formatting with Debug and Display
    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    // THEN: Neither contains the raw value
    assert!(!debug.contains(SECRET), "Debug output leaked the secret");
    assert!(!display.contains(SECRET), "Display output leaked the secret");
    assert!(debug.contains("REDACTED"));
}

/// **VALUE**: Verifies that serializing the wrapper fails instead of writing the value.
///
/// **WHY THIS MATTERS**: Config and state structs are serialized to JSON. A secret
/// embedded in one of them must make serialization fail loudly.
///
/// **BUG THIS CATCHES**: Would catch someone deriving `Serialize` on the wrapper.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    // GIVEN: A wrapped secret
    let secret = RedactedSecret::new(String::from(SECRET));

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&secret);

    // THEN: Serialization is refused
    assert!(result.is_err(), "RedactedSecret must not serialize");
    let message = result.unwrap_err().to_string();
    assert!(!message.contains(SECRET), "Error message leaked the secret");
    assert!(
        message.contains("cannot be serialized"),
        "Error should explain the refusal: {message}"
    );
}

/// **VALUE**: Verifies that `expose()` and `len()` give access to the real value.
///
/// **WHY THIS MATTERS**: Code that must hand the secret on needs the raw value; the
/// redaction must only apply to formatting.
///
/// **BUG THIS CATCHES**: Would catch accessors that return the redacted placeholder.
#[test]
fn given_secret_when_exposed_then_returns_raw_value() {
    // GIVEN: A wrapped secret
    let secret = RedactedSecret::new(String::from(SECRET));

    // THEN: Accessors return the real value and its length
    assert_eq!(secret.expose(), SECRET);
    assert_eq!(secret.len(), SECRET.len());
    assert!(!secret.is_empty());
    assert!(RedactedSecret::new(String::new()).is_empty());
}
