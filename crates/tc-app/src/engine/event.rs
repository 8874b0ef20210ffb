use tc_core::clipboard::LocalClipboardChanged;
use tc_network::SessionEvent;

/// Everything the sync engine reacts to, on one queue.
#[derive(Debug)]
pub enum EngineEvent {
    /// The local clipboard changed.
    LocalChange(String),
    /// A session was established, delivered a message or was lost.
    Session(SessionEvent),
    /// Stop the engine and close every session.
    Shutdown,
}

impl EngineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocalChange(_) => "local_change",
            Self::Session(SessionEvent::Established(_)) => "established",
            Self::Session(SessionEvent::Received { .. }) => "received",
            Self::Session(SessionEvent::Lost { .. }) => "lost",
            Self::Shutdown => "shutdown",
        }
    }
}

impl From<SessionEvent> for EngineEvent {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}

impl From<LocalClipboardChanged> for EngineEvent {
    fn from(change: LocalClipboardChanged) -> Self {
        Self::LocalChange(change.into_text())
    }
}
