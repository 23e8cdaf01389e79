//! Shared-secret wrapper with redacted Debug/Display output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// A secret handed over by a trusted local peer.
///
/// The value never shows up in logs, refuses to serialize, and is wiped from
/// memory when dropped.
#[derive(Clone)]
pub struct RedactedSecret {
    inner: String,
}

impl RedactedSecret {
    pub fn new(secret: String) -> Self {
        Self { inner: secret }
    }

    /// Raw secret value.
    ///
    /// The server never reads it back (envelope tokens are not verified); it
    /// is the only way for a holder to hand the secret on, e.g. a client
    /// answering the same peer, and for asserting what the peer delivered.
    ///
    /// # Security Note
    /// Never log or format the returned value.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Secret length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedSecret([REDACTED])")
    }
}

impl fmt::Display for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED SECRET]")
    }
}

impl Drop for RedactedSecret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl serde::Serialize for RedactedSecret {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("RedactedSecret cannot be serialized"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
