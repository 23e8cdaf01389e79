//! Shared building blocks for the dialogue server workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking and secret wrappers
//! - **dialogue-core**: the socket server, auth gateway and dispatcher
//! - **dialogue-server**: the binary wiring config, logging and shutdown
//!
//! Nothing in here knows about sockets or the wire protocol.

pub mod error;
pub mod redacted_secret;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_secret::RedactedSecret;
