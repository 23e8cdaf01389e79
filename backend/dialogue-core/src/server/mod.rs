//! Local socket server.
//!
//! # Architecture
//!
//! ```text
//! ConnectionAcceptor ──► ClientSession (one task per connection)
//!        │                    │
//!        ▼                    ├──► AuthGateway (handshake, envelope)
//! SessionRegistry             └──► RequestDispatcher ──► Engine (one at a time)
//! ```
//!
//! All shared state lives in a [`ServerContext`] built once per server and
//! handed to every task behind an `Arc`.
//!
//! # Locking
//!
//! The registry, the authenticated set and the engine each have their own
//! lock. A slow engine call only blocks other engine calls, never handshakes
//! or protocol parsing.

mod acceptor;
mod context;
mod dispatcher;
mod handle;
mod registry;
mod session;

pub use acceptor::start_server;
pub use context::ServerContext;
pub use dispatcher::RequestDispatcher;
pub use handle::ServerHandle;
pub use registry::{SessionHandle, SessionLease, SessionRegistry};
pub use session::{CloseReason, SessionState};

#[cfg(test)]
pub(crate) use acceptor::{accept_backoff, admit, bind_error};
#[cfg(test)]
pub(crate) use session::{ClientSession, serve_connection};
