//! Conflict policy for concurrent clipboard updates.
//!
//! Last writer wins by version counter; equal counters are ordered by origin
//! node id. Wall-clock timestamps never take part in the decision.

use std::cmp::Ordering;

use super::ClipboardEntry;

/// Why an incoming entry was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Version zero is the "no value" marker and never travels as an update.
    NoVersion,
    /// The incoming version is lower than the current one.
    Stale,
    /// Same version, but the origin does not sort after the current origin.
    LostTieBreak,
    /// The exact entry is already current.
    Duplicate,
}

pub struct ConflictPolicy;

impl ConflictPolicy {
    /// Decide whether `incoming` supersedes `current`.
    pub fn evaluate(current: &ClipboardEntry, incoming: &ClipboardEntry) -> Result<(), RejectReason> {
        if incoming.version == 0 {
            return Err(RejectReason::NoVersion);
        }

        match incoming.version.cmp(&current.version) {
            Ordering::Greater => Ok(()),
            Ordering::Less => Err(RejectReason::Stale),
            Ordering::Equal => match incoming.origin_id.cmp(&current.origin_id) {
                Ordering::Greater => Ok(()),
                Ordering::Equal => Err(RejectReason::Duplicate),
                Ordering::Less => Err(RejectReason::LostTieBreak),
            },
        }
    }

    pub fn supersedes(current: &ClipboardEntry, incoming: &ClipboardEntry) -> bool {
        Self::evaluate(current, incoming).is_ok()
    }
}
