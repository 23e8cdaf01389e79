use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures while fetching the shared secret from the local auth peer.
///
/// None of these are fatal: the gateway logs them and runs with
/// authentication disabled.
#[derive(Debug, ThisError)]
pub enum AuthError {
    #[error("Auth Channel Error: {message} {location}")]
    Channel {
        message: String,
        location: ErrorLocation,
    },

    #[error("Auth Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Auth Secret Error: {message} {location}")]
    EmptySecret {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for AuthError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        AuthError::Channel {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
