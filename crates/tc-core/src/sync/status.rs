use serde::Serialize;

use crate::ids::{NodeId, SessionId};

/// Read-only view of the sync state, published for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub node_id: NodeId,
    pub current_version: u64,
    pub current_origin: NodeId,
    pub peers: Vec<PeerStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerStatus {
    pub session_id: SessionId,
    pub node_id: NodeId,
    pub acked_version: u64,
    /// How many versions the peer's last ack trails the current entry.
    pub behind: u64,
}
