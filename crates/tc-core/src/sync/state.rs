use std::collections::HashMap;

use crate::clipboard::{ApplyOutcome, ClipboardEntry, ClipboardStateStore};
use crate::ids::{NodeId, SessionId};

use super::{PeerStatus, SyncStatus};

/// Last version a peer has acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAck {
    pub node_id: NodeId,
    pub acked_version: u64,
}

/// Per-node sync context, owned by the sync engine.
///
/// Created at startup, updated on every accepted update, dropped at shutdown.
/// It is passed to the engine explicitly rather than living in a global.
pub struct SyncState {
    store: ClipboardStateStore,
    peers: HashMap<SessionId, PeerAck>,
}

impl SyncState {
    pub fn new(store: ClipboardStateStore) -> Self {
        Self {
            store,
            peers: HashMap::new(),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        self.store.node_id()
    }

    pub fn current(&self) -> &ClipboardEntry {
        self.store.current_value()
    }

    pub fn propose_local(&mut self, content: impl Into<String>) -> ClipboardEntry {
        self.store.propose_local(content)
    }

    pub fn apply_remote(&mut self, entry: ClipboardEntry) -> ApplyOutcome {
        self.store.apply_remote(entry)
    }

    /// Start tracking a peer. Acks begin at zero.
    pub fn track_peer(&mut self, session_id: SessionId, node_id: NodeId) {
        self.peers.entry(session_id).or_insert(PeerAck {
            node_id,
            acked_version: 0,
        });
    }

    pub fn forget_peer(&mut self, session_id: &SessionId) -> Option<PeerAck> {
        self.peers.remove(session_id)
    }

    /// Record an acknowledgment. Acks may arrive out of order, so only a
    /// higher version moves the marker. Returns false for unknown sessions.
    pub fn record_ack(&mut self, session_id: &SessionId, version: u64) -> bool {
        match self.peers.get_mut(session_id) {
            Some(peer) => {
                peer.acked_version = peer.acked_version.max(version);
                true
            }
            None => false,
        }
    }

    pub fn peer_ack(&self, session_id: &SessionId) -> Option<&PeerAck> {
        self.peers.get(session_id)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn status(&self) -> SyncStatus {
        let current = self.current();
        let mut peers: Vec<PeerStatus> = self
            .peers
            .iter()
            .map(|(session_id, ack)| PeerStatus {
                session_id: session_id.clone(),
                node_id: ack.node_id.clone(),
                acked_version: ack.acked_version,
                behind: current.version.saturating_sub(ack.acked_version),
            })
            .collect();
        peers.sort_by(|a, b| a.session_id.as_str().cmp(b.session_id.as_str()));

        SyncStatus {
            node_id: self.node_id().clone(),
            current_version: current.version,
            current_origin: current.origin_id.clone(),
            peers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ClockPort;
    use std::sync::Arc;

    struct ZeroClock;

    impl ClockPort for ZeroClock {
        fn now_ms(&self) -> u64 {
            0
        }
    }

    fn state() -> SyncState {
        SyncState::new(ClipboardStateStore::new(NodeId::from("self"), Arc::new(ZeroClock)))
    }

    #[test]
    fn test_ack_only_moves_forward() {
        let mut state = state();
        let session = SessionId::from("s1");
        state.track_peer(session.clone(), NodeId::from("peer"));

        assert!(state.record_ack(&session, 5));
        assert!(state.record_ack(&session, 3));
        assert_eq!(state.peer_ack(&session).unwrap().acked_version, 5);
    }

    #[test]
    fn test_ack_for_unknown_session_is_ignored() {
        let mut state = state();
        assert!(!state.record_ack(&SessionId::from("ghost"), 1));
    }

    #[test]
    fn test_forget_peer() {
        let mut state = state();
        let session = SessionId::from("s1");
        state.track_peer(session.clone(), NodeId::from("peer"));
        assert_eq!(state.peer_count(), 1);

        let removed = state.forget_peer(&session).unwrap();
        assert_eq!(removed.node_id, NodeId::from("peer"));
        assert_eq!(state.peer_count(), 0);
    }

    #[test]
    fn test_status_reports_lag() {
        let mut state = state();
        let session = SessionId::from("s1");
        state.track_peer(session.clone(), NodeId::from("peer"));
        state.propose_local("a");
        state.propose_local("b");
        state.record_ack(&session, 1);

        let status = state.status();
        assert_eq!(status.current_version, 2);
        assert_eq!(status.current_origin, NodeId::from("self"));
        assert_eq!(status.peers.len(), 1);
        assert_eq!(status.peers[0].behind, 1);
    }
}
