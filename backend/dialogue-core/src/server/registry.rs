//! Process-wide table of live sessions, keyed by client identity.
//!
//! # Invariants
//!
//! - At most one session is registered per identity.
//! - An evicted session has released its connection before [`SessionRegistry::evict`]
//!   returns, so the replacement is only registered after the old one is gone.

use crate::identity::{ClientIdentity, SessionId};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, warn};
use tokio::sync::{Mutex, Notify, oneshot};

/// Registry-side handle of a live session. Used to close it from outside.
pub struct SessionHandle {
    id: SessionId,
    created_at: SystemTime,
    close: Arc<Notify>,
    released: oneshot::Receiver<()>,
}

/// Session-side counterpart of a [`SessionHandle`].
///
/// The session task holds the lease for its whole lifetime and drops it only
/// after the connection is closed and its state is cleaned up.
pub struct SessionLease {
    close: Arc<Notify>,
    _released: oneshot::Sender<()>,
}

impl SessionHandle {
    /// Create a linked handle/lease pair for a new session.
    pub fn pair() -> (Self, SessionLease) {
        let close = Arc::new(Notify::new());
        let (released_tx, released_rx) = oneshot::channel();

        let handle = Self {
            id: SessionId::new(),
            created_at: SystemTime::now(),
            close: Arc::clone(&close),
            released: released_rx,
        };
        let lease = SessionLease {
            close,
            _released: released_tx,
        };

        (handle, lease)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Ask the session to close and wait until it has released its connection.
    pub async fn close(self) {
        self.close.notify_one();
        // Err only means the lease is already gone, which is what we wait for
        let _ = self.released.await;
    }
}

impl SessionLease {
    /// Resolves once the owning [`SessionHandle`] asked the session to close.
    pub async fn closed(&self) {
        self.close.notified().await;
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ClientIdentity, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `identity`.
    ///
    /// Callers evict first. If an entry is still present it is displaced and
    /// returned so the caller can close it.
    pub async fn register(
        &self,
        identity: ClientIdentity,
        handle: SessionHandle,
    ) -> Option<SessionHandle> {
        let id = handle.id();
        let displaced = self.sessions.lock().await.insert(identity, handle);
        debug!("Registered session {id} for {identity}");
        displaced
    }

    /// Close and remove the session registered for `identity`, if any.
    ///
    /// Returns the evicted session's id once its connection has been released.
    pub async fn evict(&self, identity: &ClientIdentity) -> Option<SessionId> {
        // Lock is released before waiting: the closing session removes itself
        let handle = self.sessions.lock().await.remove(identity)?;
        let id = handle.id();

        warn!("Connection already exists for {identity}, closing session {id}");
        handle.close().await;

        Some(id)
    }

    /// Remove the entry for `identity` if it still belongs to session `id`.
    ///
    /// A session that was already replaced must not remove its successor.
    pub async fn remove(&self, identity: &ClientIdentity, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(identity) {
            Some(handle) if handle.id() == id => {
                sessions.remove(identity);
                debug!("Removed session {id} for {identity}");
                true
            }
            _ => false,
        }
    }

    /// Close every registered session and clear the table.
    ///
    /// Returns how many sessions were closed.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<(ClientIdentity, SessionHandle)> =
            self.sessions.lock().await.drain().collect();
        let count = drained.len();

        for (identity, handle) in drained {
            let id = handle.id();
            handle.close().await;
            debug!("Closed session {id} for {identity}");
        }

        count
    }

    pub async fn session_id(&self, identity: &ClientIdentity) -> Option<SessionId> {
        self.sessions.lock().await.get(identity).map(SessionHandle::id)
    }

    pub async fn contains(&self, identity: &ClientIdentity) -> bool {
        self.sessions.lock().await.contains_key(identity)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
