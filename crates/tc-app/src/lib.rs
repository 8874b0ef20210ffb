//! # tc-app
//!
//! The sync engine of tcpclipboard: a single task that owns the node's
//! sync state and turns local clipboard changes and peer messages into
//! clipboard writes, acknowledgments and broadcasts.

pub mod engine;

pub use engine::{EngineEvent, SyncEngine, SyncEngineHandle};
