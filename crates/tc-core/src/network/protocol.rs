use serde::{Deserialize, Serialize};

use crate::clipboard::ClipboardEntry;
use crate::ids::NodeId;

/// Wire protocol version announced in `Hello`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages exchanged over a session.
///
/// The variant order is part of the wire format: the encoded tag is the
/// variant index. Append new variants, never reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Hello(Hello),
    Update(ClipboardEntry),
    Ack(u64),
    Heartbeat,
    Bye,
}

/// Handshake greeting sent by both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub node_id: NodeId,
    pub protocol_version: u32,
}

impl Hello {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl Message {
    /// Short variant name for log fields and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => "hello",
            Self::Update(_) => "update",
            Self::Ack(_) => "ack",
            Self::Heartbeat => "heartbeat",
            Self::Bye => "bye",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind() {
        assert_eq!(Message::Heartbeat.kind(), "heartbeat");
        assert_eq!(Message::Ack(3).kind(), "ack");
        assert_eq!(Message::Hello(Hello::new(NodeId::from("n"))).kind(), "hello");
    }

    #[test]
    fn test_hello_uses_current_protocol_version() {
        let hello = Hello::new(NodeId::from("n"));
        assert_eq!(hello.protocol_version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_message_serde_json_round_trip() {
        let message = Message::Update(ClipboardEntry::new("テキスト", 9, NodeId::from("n"), 1));
        let json = serde_json::to_string(&message).unwrap();
        let decoded: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, message);
    }
}
