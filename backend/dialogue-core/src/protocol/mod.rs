//! Text wire protocol.
//!
//! There is no framing: whatever a single socket read returns is one message.
//! Requests are plain UTF-8:
//!
//! - `GetData` - run the engine on a fixed prompt
//! - `Stop` - acknowledge and close the connection
//! - `...Invoke:::<text>[:::Context:::<context>]` - run the engine on `text`
//! - anything else - `Invalid request`
//!
//! When authentication is enabled the client first sends [`AUTH_REQUEST`] and
//! may wrap later requests in a token envelope (see [`crate::auth::envelope`]).

use crate::error::protocol::ProtocolError;

use common::ErrorLocation;

use std::panic::Location;

pub const AUTH_REQUEST: &str = "AUTH_REQUEST";
pub const AUTH_SUCCESS: &str = "AUTH_SUCCESS";
pub const AUTH_FAILED: &str = "AUTH_FAILED";
pub const AUTH_REQUIRED: &str = "AUTH_REQUIRED";
pub const INVALID_TOKEN: &str = "INVALID_TOKEN";

pub const FETCH_COMMAND: &str = "GetData";
pub const STOP_COMMAND: &str = "Stop";
pub const INVOKE_MARKER: &str = "Invoke:::";
pub const CONTEXT_MARKER: &str = "Context:::";
pub const SEGMENT_DELIMITER: &str = ":::";

/// Prompt sent to the engine for a [`Request::Fetch`].
pub const FETCH_PROMPT: &str = "You are the server, say hello and something random";
pub const STOP_ACKNOWLEDGEMENT: &str = "Server stopping...";
pub const INVALID_REQUEST: &str = "Invalid request";
pub const ENGINE_FAILURE: &str = "Error processing request";

const TEXT_SEGMENT: usize = 1;
const CONTEXT_SEGMENT: usize = 3;

/// A classified application request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Fetch,
    Stop,
    Invoke {
        text: String,
        context: Option<String>,
    },
    Unknown,
}

impl Request {
    /// Classify an (already unwrapped) message.
    ///
    /// Priority: exact `GetData`, exact `Stop`, anything containing
    /// `Invoke:::`, then [`Request::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedInvoke`] when an invoke message lacks
    /// the context segment it announces.
    pub fn parse(message: &str) -> Result<Self, ProtocolError> {
        if message == FETCH_COMMAND {
            return Ok(Request::Fetch);
        }
        if message == STOP_COMMAND {
            return Ok(Request::Stop);
        }
        if !message.contains(INVOKE_MARKER) {
            return Ok(Request::Unknown);
        }

        let segments: Vec<&str> = message.split(SEGMENT_DELIMITER).collect();

        // Containing the marker guarantees at least two segments
        let text = segments
            .get(TEXT_SEGMENT)
            .ok_or_else(|| ProtocolError::MalformedInvoke {
                message: format!("missing text segment in {message:?}"),
                location: ErrorLocation::from(Location::caller()),
            })?
            .to_string();

        let context = if message.contains(CONTEXT_MARKER) {
            let context =
                segments
                    .get(CONTEXT_SEGMENT)
                    .ok_or_else(|| ProtocolError::MalformedInvoke {
                        message: format!(
                            "expected {} segments with context, got {}",
                            CONTEXT_SEGMENT + 1,
                            segments.len()
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            Some(context.to_string())
        } else {
            None
        };

        Ok(Request::Invoke { text, context })
    }

    /// Whether handling this request ends the session.
    pub fn closes_session(&self) -> bool {
        matches!(self, Request::Stop)
    }
}

/// Client-side check for a response that signals failure.
pub fn is_error_response(response: &str) -> bool {
    response.is_empty() || response == AUTH_FAILED || response == INVALID_TOKEN
}
