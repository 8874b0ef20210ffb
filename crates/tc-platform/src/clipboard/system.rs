use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use tc_core::ports::SystemClipboardPort;

/// The desktop clipboard.
///
/// `arboard::Clipboard` is not `Sync`, so access is serialized.
pub struct SystemClipboard {
    inner: Mutex<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("failed to open system clipboard")?;
        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }
}

impl SystemClipboardPort for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("system clipboard lock poisoned"))?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(err) => Err(err).context("failed to read clipboard text"),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("system clipboard lock poisoned"))?;
        clipboard
            .set_text(text.to_owned())
            .context("failed to write clipboard text")
    }
}
