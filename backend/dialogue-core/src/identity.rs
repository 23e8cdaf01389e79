//! Identities used to key sessions and authentication state.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::net::SocketAddr;

use uuid::Uuid;

/// Transport-level identity of a connected peer (address + port).
///
/// Two connections from the same address and port are treated as the same
/// client; the newer one replaces the older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIdentity(SocketAddr);

impl ClientIdentity {
    pub fn addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for ClientIdentity {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl Display for ClientIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// Unique id of one live session.
///
/// Distinguishes an evicted session from its replacement, which share a
/// [`ClientIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}
