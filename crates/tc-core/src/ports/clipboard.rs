//! Clipboard port - abstracts platform clipboard access
//!
//! Both operations are best-effort: the sync engine logs failures and keeps
//! serving peers.

use anyhow::Result;

pub trait SystemClipboardPort: Send + Sync {
    /// Read the current clipboard text.
    ///
    /// Returns `Ok(None)` when the clipboard holds no text.
    fn read_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard text.
    fn write_text(&self, text: &str) -> Result<()>;
}
