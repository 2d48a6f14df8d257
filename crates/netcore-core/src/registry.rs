//! Session registry shared by every `ServerCore`.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use tracing::debug;

use crate::buffer::Buffer;
use crate::handler::Handler;
use crate::id::Id;
use crate::session::{Session, SessionState};

/// `Id -> Session` map with snapshot-on-iterate fan-out.
///
/// One lock per server, held only around insert, remove, and the
/// snapshot copy taken before a multicast — never across an await point,
/// per spec.md §5's "Shared resource policy".
#[derive(Debug)]
pub struct Registry<H: Handler> {
    sessions: StdMutex<HashMap<Id, Session<H>>>,
}

impl<H: Handler> Default for Registry<H> {
    fn default() -> Self {
        Self {
            sessions: StdMutex::new(HashMap::new()),
        }
    }
}

impl<H: Handler> Registry<H> {
    /// A new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its id. A session already `Disconnected`
    /// by the time this runs (race with a very fast peer close) is
    /// dropped rather than registered, preserving "registered iff not yet
    /// Disconnected".
    pub fn insert(&self, session: Session<H>) {
        if session.state() == SessionState::Disconnected {
            return;
        }
        self.sessions
            .lock()
            .expect("registry mutex poisoned")
            .insert(session.id(), session);
    }

    /// Remove a session by id, e.g. once it reaches `Disconnected`.
    pub fn remove(&self, id: Id) -> Option<Session<H>> {
        self.sessions.lock().expect("registry mutex poisoned").remove(&id)
    }

    /// Number of currently registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("registry mutex poisoned").len()
    }

    /// Whether the registry currently holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time copy of every registered session, safe to iterate
    /// without holding the registry lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Session<H>> {
        self.sessions
            .lock()
            .expect("registry mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Fan-out: enqueue the same bytes on every currently registered
    /// session's send pipeline. Per spec.md §4.4, ordering is guaranteed
    /// only within a single session's own stream, never across sessions,
    /// and this call is not atomic across sessions; a session that
    /// disconnects mid-iteration is simply skipped.
    pub fn multicast(&self, bytes: impl Into<Buffer>) {
        let bytes = bytes.into();
        let snapshot = self.snapshot();
        debug!(sessions = snapshot.len(), bytes = bytes.len(), "multicast");
        for session in snapshot {
            if session.state() == SessionState::Disconnected {
                continue;
            }
            let _ = session.send_async(bytes.clone());
        }
    }

    /// Disconnect every registered session and wait for the registry to
    /// drain. Used by `ServerCore::stop`.
    pub async fn disconnect_all(&self) {
        let snapshot = self.snapshot();
        for session in snapshot {
            session.disconnect().await;
            self.remove(session.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    struct Silent;
    impl Handler for Silent {}

    #[tokio::test]
    async fn insert_remove_and_snapshot() {
        let registry: Registry<Silent> = Registry::new();
        let (_a, server_a) = duplex(16);
        let session = Session::connect(Silent, server_a);
        let id = session.id();
        registry.insert(session);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot().len(), 1);
        registry.remove(id);
        assert!(registry.is_empty());
    }
}
