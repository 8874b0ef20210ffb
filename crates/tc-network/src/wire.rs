//! Binary wire encoding of [`Message`].
//!
//! Payload layout (all integers fixed-width big-endian):
//!
//! ```text
//! tag:u32 | body
//!
//! Hello     0 | node_id_len:u64 node_id:utf8 | protocol_version:u32
//! Update    1 | content_len:u64 content:utf8 | version:u64
//!             | origin_len:u64 origin:utf8   | timestamp:u64
//! Ack       2 | version:u64
//! Heartbeat 3 |
//! Bye       4 |
//! ```
//!
//! Trailing bytes after a complete message are rejected.

use bincode::Options;
use bytes::Bytes;
use tc_core::Message;

use crate::error::ProtocolError;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

pub fn encode_message(message: &Message) -> Result<Bytes, ProtocolError> {
    wire_options()
        .serialize(message)
        .map(Bytes::from)
        .map_err(|e| ProtocolError::Malformed(format!("failed to encode {}: {}", message.kind(), e)))
}

pub fn decode_message(payload: &[u8]) -> Result<Message, ProtocolError> {
    wire_options()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::{ClipboardEntry, Hello, NodeId};

    fn all_variants() -> Vec<Message> {
        vec![
            Message::Hello(Hello::new(NodeId::from("node-a"))),
            Message::Hello(Hello {
                node_id: NodeId::default(),
                protocol_version: u32::MAX,
            }),
            Message::Update(ClipboardEntry::new(
                "お腹がすいた\nline two",
                u64::MAX,
                NodeId::from("端末"),
                1_700_000_000_123,
            )),
            Message::Update(ClipboardEntry::empty()),
            Message::Ack(0),
            Message::Ack(42),
            Message::Heartbeat,
            Message::Bye,
        ]
    }

    #[test]
    fn test_every_variant_round_trips() {
        for message in all_variants() {
            let bytes = encode_message(&message).unwrap();
            assert_eq!(decode_message(&bytes).unwrap(), message);
        }
    }

    #[test]
    fn test_ack_layout() {
        let bytes = encode_message(&Message::Ack(5)).unwrap();
        assert_eq!(&bytes[..], &[0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 5]);
    }

    #[test]
    fn test_unit_variant_layout() {
        assert_eq!(&encode_message(&Message::Heartbeat).unwrap()[..], &[0, 0, 0, 3]);
        assert_eq!(&encode_message(&Message::Bye).unwrap()[..], &[0, 0, 0, 4]);
    }

    #[test]
    fn test_hello_layout() {
        let bytes = encode_message(&Message::Hello(Hello {
            node_id: NodeId::from("ab"),
            protocol_version: 1,
        }))
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, b'a', b'b', 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_unknown_tag_is_malformed() {
        let err = decode_message(&[0, 0, 0, 9]).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = encode_message(&Message::Bye).unwrap().to_vec();
        bytes.push(0);
        assert!(decode_message(&bytes).is_err());
    }

    #[test]
    fn test_truncated_update_is_rejected() {
        let bytes = encode_message(&Message::Update(ClipboardEntry::new(
            "hello",
            1,
            NodeId::from("n"),
            0,
        )))
        .unwrap();
        assert!(decode_message(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        // Hello whose 1-byte node id is not UTF-8.
        let bytes = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0xff, 0, 0, 0, 1];
        assert!(decode_message(&bytes).is_err());
    }
}
