//! Authentication gateway.
//!
//! At startup the gateway fetches a shared secret from a trusted local peer.
//! If that fails, or no channel is configured, authentication is disabled and
//! every request passes straight through.
//!
//! # Security
//!
//! This is a fail-open design. With a secret configured, the handshake marks
//! the peer authenticated without checking any credential, and envelope
//! tokens are parsed but never verified. Both behaviours are deliberate and
//! observable by existing clients; tightening them is a protocol change.

pub mod channel;
pub mod envelope;

use crate::identity::ClientIdentity;

use common::RedactedSecret;

use std::collections::HashSet;
use std::time::Duration;

use envelope::Envelope;
use log::{debug, info, warn};
use tokio::sync::RwLock;

pub struct AuthGateway {
    /// Absent means authentication is disabled.
    secret: Option<RedactedSecret>,

    /// Identities that completed the handshake and still have a live session.
    authenticated: RwLock<HashSet<ClientIdentity>>,
}

impl AuthGateway {
    /// Gateway with authentication disabled.
    pub fn disabled() -> Self {
        Self {
            secret: None,
            authenticated: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_secret(secret: RedactedSecret) -> Self {
        Self {
            secret: Some(secret),
            authenticated: RwLock::new(HashSet::new()),
        }
    }

    /// Build the gateway, fetching the secret over `channel` when one is given.
    ///
    /// Never fails: any channel error disables authentication.
    pub async fn connect(channel: Option<&str>, limit: Duration) -> Self {
        let Some(channel) = channel else {
            info!("No auth channel configured, authentication disabled");
            return Self::disabled();
        };

        match channel::fetch_secret(channel, limit).await {
            Ok(secret) => {
                info!(
                    "Received shared secret ({} bytes) from auth channel {channel}",
                    secret.len()
                );
                Self::with_secret(secret)
            }
            Err(e) => {
                warn!("Auth channel unavailable, authentication disabled: {e}");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Complete the handshake for `identity`.
    ///
    /// Always succeeds. The identity is only recorded when a secret is configured.
    pub async fn authenticate(&self, identity: ClientIdentity) -> bool {
        if self.secret.is_none() {
            return true;
        }

        let newly_added = self.authenticated.write().await.insert(identity);
        if newly_added {
            info!("Client {identity} authenticated");
        } else {
            debug!("Client {identity} was already authenticated");
        }
        true
    }

    /// Check a request from `identity` and strip its token envelope.
    ///
    /// Returns `None` when a secret is configured and `identity` never
    /// completed the handshake. Messages without an envelope pass through as-is.
    pub async fn validate(&self, identity: &ClientIdentity, raw: &str) -> Option<String> {
        if self.secret.is_none() {
            return Some(raw.to_string());
        }

        if !self.authenticated.read().await.contains(identity) {
            warn!("Rejected request from unauthenticated client {identity}");
            return None;
        }

        match Envelope::parse(raw) {
            Some(envelope) => {
                debug!("Unwrapped token envelope from {identity}");
                Some(envelope.payload.to_string())
            }
            None => Some(raw.to_string()),
        }
    }

    /// Forget `identity`. Called when its session is destroyed.
    pub async fn purge(&self, identity: &ClientIdentity) {
        if self.authenticated.write().await.remove(identity) {
            debug!("Purged authentication for {identity}");
        }
    }

    pub async fn is_authenticated(&self, identity: &ClientIdentity) -> bool {
        self.authenticated.read().await.contains(identity)
    }
}
