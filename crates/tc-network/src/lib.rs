//! # tc-network
//!
//! TCP networking layer for tcpclipboard.
//!
//! This crate provides:
//! - Length-prefixed framing over any async byte stream
//! - The binary wire encoding of protocol messages
//! - Sessions: handshake, heartbeats, liveness and graceful close
//! - A session manager for dialing, accepting and reconnecting
//! - The peer registry used for broadcast fan-out

pub mod error;
pub mod framing;
pub mod manager;
pub mod registry;
pub mod session;
pub mod wire;

pub use error::{ConnectError, ProtocolError, SendError, SessionError, TransportError};
pub use framing::{FrameCodec, FramedTransport};
pub use manager::SessionManager;
pub use registry::{BroadcastReport, PeerRegistry};
pub use session::{Role, Session, SessionConfig, SessionEvent, SessionHandle};

// Re-export commonly used types from tc-core
pub use tc_core::network::{Hello, Message, SessionState, PROTOCOL_VERSION};
