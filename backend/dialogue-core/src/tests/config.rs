// Unit tests for ServerConfig load/save/validate

use crate::config::{MAX_READ_BUFFER_SIZE, ServerConfig};
use crate::error::config::ConfigError;

use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies that a missing config file yields defaults.
///
/// **WHY THIS MATTERS**: First start on a machine has no config file; the server
/// must still come up on the well-known port.
///
/// **BUG THIS CATCHES**: Would catch `load()` erroring on a missing file.
#[test]
fn given_missing_file_when_loaded_then_defaults() {
    // GIVEN: An empty config directory
    let dir = TempDir::new().unwrap();

    // WHEN: Loading
    let config = ServerConfig::load(dir.path()).unwrap();

    // THEN: Defaults are returned
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.bind_address(), "127.0.0.1:25001");
    assert_eq!(config.read_buffer_size, 1024);
    assert_eq!(config.read_timeout(), None);
}

/// **VALUE**: Verifies that save + load keeps every field.
///
/// **WHY THIS MATTERS**: Operators tune the port and timeouts through this file.
///
/// **BUG THIS CATCHES**: Would catch a field missing its serde attribute and
/// silently resetting to the default.
#[test]
fn given_saved_config_when_loaded_then_values_kept() {
    // GIVEN: A customized config saved to disk
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        port: 31337,
        read_timeout_ms: Some(250),
        auth_channel_timeout_ms: 900,
        ..ServerConfig::default()
    };
    config.save(dir.path()).unwrap();

    // WHEN: Loading it back
    let loaded = ServerConfig::load(dir.path()).unwrap();

    // THEN: Values survive and no temp file is left behind
    assert_eq!(loaded, config);
    assert_eq!(loaded.read_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(loaded.auth_channel_timeout(), Duration::from_millis(900));
    assert!(!dir.path().join("config.json.tmp").exists());
}

/// **VALUE**: Verifies that partial files are completed with defaults.
///
/// **BUG THIS CATCHES**: Would catch missing `#[serde(default)]` attributes.
#[test]
fn given_partial_file_when_loaded_then_missing_fields_defaulted() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), r#"{ "port": 4000 }"#).unwrap();

    let config = ServerConfig::load(dir.path()).unwrap();

    assert_eq!(config.port, 4000);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.listen_backlog, 5);
}

/// **VALUE**: Verifies that a corrupt file is reported, not silently replaced.
///
/// **BUG THIS CATCHES**: Would catch `load()` swallowing parse errors.
#[test]
fn given_corrupt_file_when_loaded_then_parse_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let result = ServerConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies that valid JSON of the wrong shape is rejected.
///
/// **WHY THIS MATTERS**: Every field has a default, so a top-level array or
/// scalar would otherwise load as the default config and hide the mistake.
///
/// **BUG THIS CATCHES**: Would catch `[]` or `42` starting the server on the
/// default port instead of failing with a parse error.
#[test]
fn given_non_object_json_when_loaded_then_parse_error() {
    for contents in ["[]", "[1, 2]", "42", "null"] {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), contents).unwrap();

        let result = ServerConfig::load(dir.path());

        assert!(
            matches!(result, Err(ConfigError::ParseError { .. })),
            "{contents} should not load"
        );
    }
}

/// **VALUE**: Verifies that the server refuses to bind a routable interface.
///
/// **WHY THIS MATTERS**: Authentication is fail-open; exposing the port beyond
/// localhost would expose the engine to the network.
///
/// **BUG THIS CATCHES**: Would catch a missing loopback check.
#[test]
fn given_non_loopback_host_when_validated_then_rejected() {
    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        ..ServerConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **VALUE**: Verifies bounds on numeric settings.
///
/// **BUG THIS CATCHES**: Would catch a zero-sized read buffer (every read would
/// look like a disconnect) or a zero timeout (a busy retry loop).
#[test]
fn given_out_of_range_values_when_validated_then_rejected() {
    let invalid = [
        ServerConfig {
            read_buffer_size: 0,
            ..ServerConfig::default()
        },
        ServerConfig {
            read_buffer_size: MAX_READ_BUFFER_SIZE + 1,
            ..ServerConfig::default()
        },
        ServerConfig {
            read_timeout_ms: Some(0),
            ..ServerConfig::default()
        },
        ServerConfig {
            listen_backlog: 0,
            ..ServerConfig::default()
        },
        ServerConfig {
            version: 0,
            ..ServerConfig::default()
        },
    ];

    for config in invalid {
        assert!(config.validate().is_err(), "Expected {config:?} to be rejected");
    }
}

/// **VALUE**: Verifies IPv6 loopback formatting.
///
/// **BUG THIS CATCHES**: Would catch `::1:25001`, which does not parse as a socket address.
#[test]
fn given_ipv6_loopback_when_formatted_then_bracketed() {
    let config = ServerConfig {
        host: String::from("::1"),
        ..ServerConfig::default()
    };

    assert!(config.validate().is_ok());
    assert_eq!(config.bind_address(), "[::1]:25001");
}
