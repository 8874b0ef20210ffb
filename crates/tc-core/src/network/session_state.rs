use serde::{Deserialize, Serialize};

/// Lifecycle of one TCP session
///
/// Design principle: This is a pure type state machine with only state
/// definitions and transition validation logic. Timers, sockets and retries
/// live in `tc-network`.
///
/// State transitions:
///
/// ```text
/// Connecting ──→ Handshaking ──→ Active ──→ Closing ──→ Closed
///      │               │                       ↑
///      └───────────────┴───────────────────────┘   (any failure)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Dialing, or accepted and not yet greeted
    Connecting,

    /// Exchanging `Hello`
    Handshaking,

    /// Handshake complete, messages flow
    Active,

    /// Tearing down the connection
    Closing,

    /// Connection released
    Closed,
}

impl SessionState {
    /// Closing and Closed are terminal: a session never comes back from them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn start_handshake(self) -> Option<Self> {
        match self {
            Self::Connecting => Some(Self::Handshaking),
            _ => None,
        }
    }

    pub fn on_handshake_complete(self) -> Option<Self> {
        match self {
            Self::Handshaking => Some(Self::Active),
            _ => None,
        }
    }

    /// Any error or close request moves a live session to Closing.
    pub fn close(self) -> Self {
        match self {
            Self::Closed => Self::Closed,
            _ => Self::Closing,
        }
    }

    pub fn on_closed(self) -> Self {
        Self::Closed
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Connecting
    }
}
