use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tc_core::ports::SystemClipboardPort;

/// Process-local clipboard, for headless nodes and tests.
///
/// Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClipboard {
    value: Arc<Mutex<Option<String>>>,
}

impl InMemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(text.into()))),
        }
    }

    /// Replace the value as if a user had copied `text`.
    pub fn set(&self, text: impl Into<String>) -> Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| anyhow!("in-memory clipboard lock poisoned"))?;
        *value = Some(text.into());
        Ok(())
    }
}

impl SystemClipboardPort for InMemoryClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        let value = self
            .value
            .lock()
            .map_err(|_| anyhow!("in-memory clipboard lock poisoned"))?;
        Ok(value.clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.set(text)
    }
}
