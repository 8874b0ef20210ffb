use std::fmt;

use tc_core::{Message, NodeId, SessionId};

use super::SessionHandle;

/// What a session reports to its owner's event queue.
///
/// The owner supplies a queue of its own event type `E: From<SessionEvent>`,
/// so sessions and local sources can feed one single-consumer queue.
#[derive(Debug)]
pub enum SessionEvent {
    /// Handshake done, the session accepts messages. Always queued before
    /// any `Received` of the same session.
    Established(SessionHandle),

    /// An `Update` or `Ack` from the peer. Handshake, heartbeat and bye
    /// messages are consumed by the session itself.
    Received {
        session_id: SessionId,
        message: Message,
    },

    /// The session reached `Closed`.
    Lost {
        session_id: SessionId,
        node_id: NodeId,
        reason: CloseReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Cancelled locally (shutdown, stalled peer).
    Local,
    /// The peer sent `Bye`.
    PeerBye,
    /// The peer closed the connection.
    PeerClosed,
    /// No message within the liveness window.
    HeartbeatTimeout,
    /// Transport or protocol failure.
    Error(String),
}

impl CloseReason {
    /// Whether the close was expected, as opposed to a fault.
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::Local | Self::PeerBye)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "closed locally"),
            Self::PeerBye => write!(f, "peer said bye"),
            Self::PeerClosed => write!(f, "peer closed the connection"),
            Self::HeartbeatTimeout => write!(f, "heartbeat timeout"),
            Self::Error(message) => write!(f, "{message}"),
        }
    }
}
