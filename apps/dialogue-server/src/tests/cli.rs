// Unit tests for command line parsing

use crate::cli::Cli;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use log::LevelFilter;
use serial_test::serial;

/// **VALUE**: Verifies the clap definition is internally consistent.
///
/// **BUG THIS CATCHES**: Would catch duplicate flags or invalid attributes,
/// which clap only reports at runtime.
#[test]
fn given_cli_definition_when_checked_then_valid() {
    Cli::command().debug_assert();
}

/// **VALUE**: Verifies that every flag parses into its field.
///
/// **BUG THIS CATCHES**: Would catch renamed flags breaking existing launchers.
#[test]
#[serial]
fn given_all_flags_when_parsed_then_fields_populated() {
    let cli = Cli::try_parse_from([
        "dialogue-server",
        "--auth-pipe",
        "dialogue-auth",
        "--config-dir",
        "/tmp/dialogue-config",
        "--port",
        "26000",
        "--log-dir",
        "/tmp/dialogue-logs",
        "--log-level",
        "trace",
    ])
    .unwrap();

    assert_eq!(cli.auth_pipe.as_deref(), Some("dialogue-auth"));
    assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/dialogue-config")));
    assert_eq!(cli.port, Some(26000));
    assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/dialogue-logs")));
    assert_eq!(cli.log_level, Some(LevelFilter::Trace));
}

/// **VALUE**: Verifies that all options are optional.
///
/// **WHY THIS MATTERS**: Running with no arguments starts an unauthenticated
/// server with defaults.
#[test]
#[serial]
fn given_no_flags_when_parsed_then_all_none() {
    let cli = Cli::try_parse_from(["dialogue-server"]).unwrap();

    assert!(cli.auth_pipe.is_none());
    assert!(cli.port.is_none());
}

/// **VALUE**: Verifies that invalid values are rejected at parse time.
#[test]
fn given_invalid_values_when_parsed_then_error() {
    assert!(Cli::try_parse_from(["dialogue-server", "--port", "70000"]).is_err());
    assert!(Cli::try_parse_from(["dialogue-server", "--log-level", "loud"]).is_err());
}
