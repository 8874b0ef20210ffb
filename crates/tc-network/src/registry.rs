//! Registry of live sessions, used for broadcast fan-out.

use std::collections::{HashMap, HashSet};

use tc_core::{Message, SessionId};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SendError;
use crate::session::SessionHandle;

/// Outcome of one broadcast round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<SessionId>,
    pub failed: Vec<(SessionId, SendError)>,
}

impl BroadcastReport {
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PeerRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle previously registered under the same id, if any.
    pub async fn register(&self, handle: SessionHandle) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(handle.id().clone(), handle)
    }

    pub async fn unregister(&self, session_id: &SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Queue a message for one session. A stalled session is closed.
    pub async fn send_to(&self, session_id: &SessionId, message: Message) -> Result<(), SendError> {
        let handle = self
            .get(session_id)
            .await
            .ok_or(SendError::UnknownSession)?;
        deliver(&handle, message)
    }

    /// Queue `message` for every active session not in `excluding`.
    ///
    /// Sends never wait: the registry lock is released before the first
    /// send, and a failing session is skipped without affecting the rest.
    pub async fn broadcast(
        &self,
        message: &Message,
        excluding: &HashSet<SessionId>,
    ) -> BroadcastReport {
        let targets: Vec<SessionHandle> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|handle| !excluding.contains(handle.id()))
                .cloned()
                .collect()
        };

        let mut report = BroadcastReport::default();
        for handle in targets {
            if !handle.is_active() {
                report.failed.push((handle.id().clone(), SendError::Closed));
                continue;
            }
            match deliver(&handle, message.clone()) {
                Ok(()) => report.delivered.push(handle.id().clone()),
                Err(err) => report.failed.push((handle.id().clone(), err)),
            }
        }

        debug!(
            kind = message.kind(),
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "broadcast"
        );
        report
    }

    /// Close every session and empty the registry.
    pub async fn close_all(&self) {
        let drained: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        for handle in &drained {
            handle.close();
        }
    }
}

fn deliver(handle: &SessionHandle, message: Message) -> Result<(), SendError> {
    let result = handle.send(message);
    if let Err(SendError::Backpressure) = result {
        warn!(
            session_id = %handle.id(),
            peer = %handle.peer_node_id(),
            "peer stalled, closing session"
        );
        handle.close();
    }
    result
}
