use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use super::EngineEvent;

/// Producer side of the engine queue.
#[derive(Debug, Clone)]
pub struct SyncEngineHandle {
    sender: mpsc::Sender<EngineEvent>,
}

impl SyncEngineHandle {
    pub(crate) fn new(sender: mpsc::Sender<EngineEvent>) -> Self {
        Self { sender }
    }

    /// Queue sender for sessions and the clipboard watcher.
    pub fn sender(&self) -> mpsc::Sender<EngineEvent> {
        self.sender.clone()
    }

    pub async fn local_change(&self, text: impl Into<String>) -> Result<()> {
        self.sender
            .send(EngineEvent::LocalChange(text.into()))
            .await
            .map_err(|_| anyhow!("sync engine is not running"))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(EngineEvent::Shutdown)
            .await
            .map_err(|_| anyhow!("sync engine is not running"))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
