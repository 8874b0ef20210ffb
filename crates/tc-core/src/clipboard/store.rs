use std::sync::Arc;

use super::{ClipboardEntry, ConflictPolicy, RejectReason};
use crate::ids::NodeId;
use crate::ports::ClockPort;

/// Result of offering a remote entry to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The entry replaced the current value. A clipboard write and an `Ack`
    /// to the sender are now owed.
    Applied,
    /// The entry lost against the current value. Not an error.
    Rejected(RejectReason),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Holds the last known clipboard value and its version clock.
///
/// The version counter is shared across the topology: local proposals always
/// take `current.version + 1`, so a local change made after accepting a remote
/// entry sorts after it.
pub struct ClipboardStateStore {
    node_id: NodeId,
    current: ClipboardEntry,
    clock: Arc<dyn ClockPort>,
}

impl ClipboardStateStore {
    pub fn new(node_id: NodeId, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            node_id,
            current: ClipboardEntry::empty(),
            clock,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn current_value(&self) -> &ClipboardEntry {
        &self.current
    }

    pub fn current_version(&self) -> u64 {
        self.current.version
    }

    /// Version a local clipboard change. Always accepted.
    pub fn propose_local(&mut self, content: impl Into<String>) -> ClipboardEntry {
        let entry = ClipboardEntry::new(
            content,
            self.current.version.saturating_add(1),
            self.node_id.clone(),
            self.clock.now_ms(),
        );
        self.current = entry.clone();
        entry
    }

    /// Offer an entry received from a peer.
    pub fn apply_remote(&mut self, entry: ClipboardEntry) -> ApplyOutcome {
        match ConflictPolicy::evaluate(&self.current, &entry) {
            Ok(()) => {
                self.current = entry;
                ApplyOutcome::Applied
            }
            Err(reason) => ApplyOutcome::Rejected(reason),
        }
    }
}
