//! Adapter selection: turns configuration into port implementations.

use std::sync::Arc;

use anyhow::Context;
use tc_app::{EngineEvent, SyncEngine};
use tc_core::config::{AppConfig, ClipboardBackend};
use tc_core::ports::{SystemClipboardPort, TextSegmenterPort};
use tc_core::{ClipboardStateStore, NodeId, SyncState};
use tc_network::{PeerRegistry, SessionConfig};
use tc_platform::{InMemoryClipboard, ScriptSegmenter, StdioClipboard, SystemClipboard, SystemClock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Open the configured clipboard backend.
///
/// The stdio backend starts reading stdin right away, queues each line on
/// `events` and stops with `cancel`.
pub fn build_clipboard(
    backend: ClipboardBackend,
    events: &mpsc::Sender<EngineEvent>,
    cancel: &CancellationToken,
) -> anyhow::Result<Arc<dyn SystemClipboardPort>> {
    info!(?backend, "clipboard backend");
    let clipboard: Arc<dyn SystemClipboardPort> = match backend {
        ClipboardBackend::System => {
            Arc::new(SystemClipboard::new().context("system clipboard unavailable")?)
        }
        ClipboardBackend::Memory => Arc::new(InMemoryClipboard::new()),
        ClipboardBackend::Stdio => {
            let clipboard = StdioClipboard::new();
            clipboard.spawn_stdin_reader(events.clone(), cancel.child_token());
            Arc::new(clipboard)
        }
    };
    Ok(clipboard)
}

pub fn build_segmenter(config: &AppConfig) -> Option<Arc<dyn TextSegmenterPort>> {
    config
        .diagnostics
        .segment_text
        .then(|| Arc::new(ScriptSegmenter::new()) as Arc<dyn TextSegmenterPort>)
}

pub fn build_session_config(node_id: &NodeId, config: &AppConfig) -> SessionConfig {
    SessionConfig::from_network_config(node_id.clone(), &config.network)
}

/// Whether the backend has to be sampled for changes.
///
/// The stdio backend queues its changes itself.
pub fn needs_polling(backend: ClipboardBackend) -> bool {
    !matches!(backend, ClipboardBackend::Stdio)
}

/// Assemble the sync engine around a fresh, empty state.
pub fn build_engine(
    node_id: &NodeId,
    config: &AppConfig,
    registry: Arc<PeerRegistry>,
    clipboard: Arc<dyn SystemClipboardPort>,
) -> SyncEngine {
    let store = ClipboardStateStore::new(node_id.clone(), Arc::new(SystemClock));
    let engine = SyncEngine::new(SyncState::new(store), registry, clipboard);
    match build_segmenter(config) {
        Some(segmenter) => engine.with_segmenter(segmenter),
        None => engine,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmenter_follows_diagnostics_flag() {
        let mut config = AppConfig::default();
        assert!(build_segmenter(&config).is_some());
        config.diagnostics.segment_text = false;
        assert!(build_segmenter(&config).is_none());
    }

    #[test]
    fn test_session_config_uses_network_section() {
        let mut config = AppConfig::default();
        config.network.heartbeat_interval_secs = 2;
        let session = build_session_config(&NodeId::from("n"), &config);
        assert_eq!(session.heartbeat_interval.as_secs(), 2);
        assert_eq!(session.liveness_timeout().as_secs(), 6);
    }

    #[tokio::test]
    async fn test_memory_backend_starts_empty() {
        let (events, _rx) = mpsc::channel(1);
        let clipboard =
            build_clipboard(ClipboardBackend::Memory, &events, &CancellationToken::new()).unwrap();
        assert_eq!(clipboard.read_text().unwrap(), None);
    }

    #[test]
    fn test_only_stdio_skips_polling() {
        assert!(needs_polling(ClipboardBackend::System));
        assert!(needs_polling(ClipboardBackend::Memory));
        assert!(!needs_polling(ClipboardBackend::Stdio));
    }
}
