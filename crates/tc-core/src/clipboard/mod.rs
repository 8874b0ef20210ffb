//! Clipboard domain: versioned entries, the conflict policy and the
//! state store that applies it.

mod change;
mod entry;
mod policy;
mod store;

pub use change::LocalClipboardChanged;
pub use entry::{content_hash, ClipboardEntry};
pub use policy::{ConflictPolicy, RejectReason};
pub use store::{ApplyOutcome, ClipboardStateStore};
