use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// One versioned clipboard value.
///
/// An entry is never mutated after it has been assigned a version; a newer
/// value always arrives as a new entry that supersedes this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub content: String,
    pub version: u64,
    pub origin_id: NodeId,
    /// Milliseconds since the Unix epoch at the origin. Informational only,
    /// peers' clocks are not trusted for ordering.
    pub timestamp: u64,
}

impl ClipboardEntry {
    pub fn new(content: impl Into<String>, version: u64, origin_id: NodeId, timestamp: u64) -> Self {
        Self {
            content: content.into(),
            version,
            origin_id,
            timestamp,
        }
    }

    /// The "nothing synced yet" entry every store starts from.
    pub fn empty() -> Self {
        Self {
            content: String::new(),
            version: 0,
            origin_id: NodeId::default(),
            timestamp: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.version == 0
    }

    pub fn content_hash(&self) -> String {
        content_hash(&self.content)
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// Stable hash of clipboard text, used for change detection and log fields.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry_has_version_zero() {
        let entry = ClipboardEntry::empty();
        assert!(entry.is_empty());
        assert_eq!(entry.version, 0);
        assert!(entry.origin_id.is_empty());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = ClipboardEntry::new("お腹がすいた", 1, NodeId::from("a"), 0);
        let b = ClipboardEntry::new("お腹がすいた", 7, NodeId::from("b"), 99);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), content_hash("other"));
    }

    #[test]
    fn test_timestamp_utc() {
        let entry = ClipboardEntry::new("x", 1, NodeId::from("a"), 1_700_000_000_000);
        let ts = entry.timestamp_utc().unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
    }
}
