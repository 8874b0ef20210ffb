//! Error taxonomy of the network layer.
//!
//! Transport and protocol errors are session-fatal but never process-fatal:
//! the session runtime turns them into a peer-lost event. Only a
//! [`ConnectError`] on the initial dial reaches the user.

use std::io;
use std::time::Duration;

use tc_core::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed by peer")]
    Eof,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame exceeds max: {len} > {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unexpected {0} message")]
    Unexpected(&'static str),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("incompatible peer {node_id}: protocol v{remote}, local v{local}")]
    IncompatiblePeer {
        node_id: NodeId,
        local: u32,
        remote: u32,
    },

    #[error("no message received within {0:?}")]
    HeartbeatTimeout(Duration),

    #[error("handshake did not complete within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("send did not complete within {0:?}")]
    SendTimeout(Duration),

    #[error("session is closed")]
    Closed,
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        Self::Transport(TransportError::Protocol(err))
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        Self::Transport(TransportError::Io(err))
    }
}

impl SessionError {
    /// The peer closed the connection without a protocol violation.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Eof))
    }

    pub fn is_incompatible_peer(&self) -> bool {
        matches!(self, Self::IncompatiblePeer { .. })
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Protocol(_)))
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {addr} after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: SessionError,
    },
}

/// Failure to queue a message for a session.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("outbound queue full")]
    Backpressure,

    #[error("session closed")]
    Closed,

    #[error("unknown session")]
    UnknownSession,
}
