use dialogue_core::error::CoreError;

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors that end the server process.
///
/// Serialized to stderr on exit so the launching process can tell startup
/// failures apart.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DialogueServerError {
    /// Process setup failed (directories, logger, signal handler)
    #[error("Startup Error: {message} {location}")]
    Startup {
        message: String,
        location: ErrorLocation,
    },

    /// Config could not be loaded or is invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Server failed to bind or shut down
    #[error("Server Error: {message} {location}")]
    Server {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for DialogueServerError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match error {
            CoreError::Config(e) => DialogueServerError::Config {
                message: e.to_string(),
                location,
            },
            e => DialogueServerError::Server {
                message: e.to_string(),
                location,
            },
        }
    }
}
