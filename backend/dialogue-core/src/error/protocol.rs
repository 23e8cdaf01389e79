use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Malformed Invoke Error: {message} {location}")]
    MalformedInvoke {
        message: String,
        location: ErrorLocation,
    },
}
