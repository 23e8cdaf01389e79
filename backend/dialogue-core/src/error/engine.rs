use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EngineError {
    /// The engine ran but could not produce a response.
    #[error("Engine Invocation Error: {message} {location}")]
    Invocation {
        message: String,
        location: ErrorLocation,
    },

    /// The engine call panicked or its blocking task was cancelled.
    #[error("Engine Panicked Error: {message} {location}")]
    Panicked {
        message: String,
        location: ErrorLocation,
    },
}
