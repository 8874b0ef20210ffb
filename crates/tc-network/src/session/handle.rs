use std::net::SocketAddr;

use tc_core::{Message, NodeId, SessionId, SessionState};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::SendError;

/// Cheap, cloneable reference to a running session.
///
/// The registry and the sync engine only ever hold handles; the connection
/// itself is owned by the session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    peer_node_id: NodeId,
    peer_addr: Option<SocketAddr>,
    outbound: mpsc::Sender<Message>,
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        peer_node_id: NodeId,
        peer_addr: Option<SocketAddr>,
        outbound: mpsc::Sender<Message>,
        state: watch::Receiver<SessionState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            peer_node_id,
            peer_addr,
            outbound,
            state,
            cancel,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn peer_node_id(&self) -> &NodeId {
        &self.peer_node_id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active() && !self.cancel.is_cancelled()
    }

    /// Queue a message without waiting.
    ///
    /// A full queue means the peer is not draining its socket; the caller
    /// decides whether to close the session.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        match self.outbound.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SendError::Backpressure),
            Err(TrySendError::Closed(_)) => Err(SendError::Closed),
        }
    }

    /// Ask the session task to say bye and release the connection.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the session has released its connection.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // A dropped sender means the task is gone, which is closed as well.
        let _ = state.wait_for(|s| *s == SessionState::Closed).await;
    }
}
