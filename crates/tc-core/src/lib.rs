//! # tc-core
//!
//! Core domain models and synchronization policy for tcpclipboard.
//!
//! This crate contains pure logic without any I/O: identifiers, clipboard
//! entries and their conflict policy, protocol message types, the session
//! state machine, configuration DTOs and the ports implemented by the
//! platform layer.

pub mod clipboard;
pub mod config;
pub mod ids;
pub mod network;
pub mod ports;
pub mod sync;

// Re-export commonly used types at the crate root
pub use clipboard::{ApplyOutcome, ClipboardEntry, ClipboardStateStore, RejectReason};
pub use config::AppConfig;
pub use ids::{NodeId, SessionId};
pub use network::{Hello, Message, SessionState, PROTOCOL_VERSION};
pub use sync::{PeerAck, SyncState};
