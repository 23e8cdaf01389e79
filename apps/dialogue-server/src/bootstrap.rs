//! Process startup and shutdown.

use crate::cli::Cli;
use crate::error::DialogueServerError;
use crate::logger::{DEFAULT_LOG_LEVEL, initialize as LoggerInitialize};

use dialogue_core::auth::AuthGateway;
use dialogue_core::config::ServerConfig;
use dialogue_core::engine::EchoEngine;
use dialogue_core::error::CoreError;
use dialogue_core::server::start_server;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;
use tokio::signal::ctrl_c;

const APP_DIR_NAME: &str = "dialogue-server";
const LOG_DIR_NAME: &str = "logs";

/// Run the server until Ctrl-C.
///
/// Order: logger, config, auth channel, listener. The auth channel is
/// optional and never fatal; a bind failure is.
pub async fn run(cli: Cli) -> Result<(), DialogueServerError> {
    let log_dir = resolve_log_dir(cli.log_dir.as_deref())?;
    ensure_dir(&log_dir)?;
    LoggerInitialize(&log_dir, cli.log_level.unwrap_or(DEFAULT_LOG_LEVEL))?;

    info!("Dialogue server {} starting", env!("CARGO_PKG_VERSION"));
    info!("Log directory: {}", log_dir.display());

    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;
    let config = load_config(&config_dir, cli.port)?;

    let auth = AuthGateway::connect(cli.auth_pipe.as_deref(), config.auth_channel_timeout()).await;

    let handle = start_server(config, auth, EchoEngine)
        .await
        .map_err(CoreError::from)?;

    info!("Press Ctrl-C to stop");
    ctrl_c().await.map_err(|e| DialogueServerError::Startup {
        message: format!("Failed to listen for Ctrl-C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Interrupt received");
    handle.shutdown().await.map_err(CoreError::from)?;
    info!("Dialogue server stopped");

    Ok(())
}

/// Load `config.json` from `config_dir` and apply the CLI port override.
///
/// # Errors
///
/// Returns [`DialogueServerError::Config`] if the file is corrupt or the
/// resulting config is invalid.
pub fn load_config(
    config_dir: &Path,
    port_override: Option<u16>,
) -> Result<ServerConfig, DialogueServerError> {
    let mut config = ServerConfig::load(config_dir).map_err(CoreError::from)?;

    if let Some(port) = port_override {
        info!("Port overridden from command line: {port}");
        config.port = port;
    }

    config.validate().map_err(CoreError::from)?;
    Ok(config)
}

pub fn resolve_config_dir(explicit: Option<&Path>) -> Result<PathBuf, DialogueServerError> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| DialogueServerError::Startup {
                message: "No config directory available on this platform".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
    }
}

pub fn resolve_log_dir(explicit: Option<&Path>) -> Result<PathBuf, DialogueServerError> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(LOG_DIR_NAME))
            .ok_or_else(|| DialogueServerError::Startup {
                message: "No local data directory available on this platform".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
    }
}

fn ensure_dir(dir: &Path) -> Result<(), DialogueServerError> {
    create_dir_all(dir).map_err(|e| DialogueServerError::Startup {
        message: format!("Failed to create directory {}: {e}", dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}
