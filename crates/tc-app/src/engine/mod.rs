//! Sync engine.
//!
//! ```text
//! watcher ──LocalChange──┐
//!                        ├──▶ queue ──▶ SyncEngine ──▶ PeerRegistry ──▶ sessions
//! sessions ──Session─────┘                  │
//!                                           └──▶ platform clipboard
//! ```
//!
//! The engine is the only consumer of its queue and the only owner of the
//! [`SyncState`], so state transitions never race.

mod event;
mod handle;

pub use event::EngineEvent;
pub use handle::SyncEngineHandle;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tc_core::clipboard::content_hash;
use tc_core::ports::{SystemClipboardPort, TextSegmenterPort};
use tc_core::sync::SyncStatus;
use tc_core::{ApplyOutcome, ClipboardEntry, Message, NodeId, SessionId, SyncState};
use tc_network::session::CloseReason;
use tc_network::{BroadcastReport, PeerRegistry, SessionEvent, SessionHandle};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, info_span, warn, Instrument};

/// Remote values remembered as our own clipboard writes.
const WRITE_BACK_MEMORY: usize = 16;

pub struct SyncEngine {
    state: SyncState,
    /// Hashes of values this engine wrote to the clipboard since the last
    /// user change. The watcher reports them back, possibly after a newer
    /// remote value has already replaced them.
    written_back: VecDeque<String>,
    registry: Arc<PeerRegistry>,
    clipboard: Arc<dyn SystemClipboardPort>,
    segmenter: Option<Arc<dyn TextSegmenterPort>>,
    status: watch::Sender<SyncStatus>,
}

impl SyncEngine {
    pub fn new(
        state: SyncState,
        registry: Arc<PeerRegistry>,
        clipboard: Arc<dyn SystemClipboardPort>,
    ) -> Self {
        let (status, _) = watch::channel(state.status());
        Self {
            state,
            written_back: VecDeque::new(),
            registry,
            clipboard,
            segmenter: None,
            status,
        }
    }

    /// Log the tokens of every applied entry at debug level.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn TextSegmenterPort>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    /// Create the engine queue.
    pub fn channel(capacity: usize) -> (SyncEngineHandle, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (SyncEngineHandle::new(tx), rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn node_id(&self) -> &NodeId {
        self.state.node_id()
    }

    /// Consume events until `Shutdown` or until every sender is gone, then
    /// close all sessions.
    pub async fn run(mut self, mut events: mpsc::Receiver<EngineEvent>) {
        info!(node_id = %self.node_id(), "sync engine started");

        while let Some(event) = events.recv().await {
            if matches!(event, EngineEvent::Shutdown) {
                break;
            }
            let span = info_span!("engine", kind = event.kind());
            self.handle(event).instrument(span).await;
        }

        self.registry.close_all().await;
        info!("sync engine stopped");
    }

    pub async fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LocalChange(text) => self.on_local_change(text).await,
            EngineEvent::Session(SessionEvent::Established(handle)) => {
                self.on_established(handle).await
            }
            EngineEvent::Session(SessionEvent::Received {
                session_id,
                message,
            }) => self.on_message(session_id, message).await,
            EngineEvent::Session(SessionEvent::Lost {
                session_id,
                node_id,
                reason,
            }) => self.on_lost(session_id, node_id, reason).await,
            EngineEvent::Shutdown => self.registry.close_all().await,
        }
        self.status.send_replace(self.state.status());
    }

    async fn on_local_change(&mut self, text: String) {
        if text == self.state.current().content {
            debug!("clipboard matches current entry, nothing to send");
            return;
        }
        if self.written_back.contains(&content_hash(&text)) {
            debug!("clipboard holds a value we wrote, nothing to send");
            return;
        }
        self.written_back.clear();

        let entry = self.state.propose_local(text);
        info!(version = entry.version, bytes = entry.content.len(), "local change");

        let report = self
            .registry
            .broadcast(&Message::Update(entry), &HashSet::new())
            .await;
        log_report(&report);
    }

    async fn on_established(&mut self, handle: SessionHandle) {
        let session_id = handle.id().clone();
        let peer = handle.peer_node_id().clone();
        info!(%session_id, %peer, "peer connected");
        if &peer == self.node_id() {
            warn!(%session_id, "peer uses this node's id, conflicts will not resolve");
        }

        self.state.track_peer(session_id.clone(), peer);
        if let Some(previous) = self.registry.register(handle).await {
            previous.close();
        }

        let current = self.state.current();
        if current.version > 0 {
            let update = Message::Update(current.clone());
            if let Err(err) = self.registry.send_to(&session_id, update).await {
                warn!(%session_id, error = %err, "failed to send current entry to new peer");
            }
        }
    }

    async fn on_message(&mut self, session_id: SessionId, message: Message) {
        match message {
            Message::Update(entry) => self.on_update(session_id, entry).await,
            Message::Ack(version) => {
                if self.state.record_ack(&session_id, version) {
                    debug!(%session_id, version, "ack");
                } else {
                    debug!(%session_id, version, "ack from untracked session");
                }
            }
            other => debug!(%session_id, kind = other.kind(), "ignoring message"),
        }
    }

    async fn on_update(&mut self, session_id: SessionId, entry: ClipboardEntry) {
        let version = entry.version;
        let origin = entry.origin_id.clone();

        match self.state.apply_remote(entry.clone()) {
            ApplyOutcome::Applied => {
                info!(%session_id, %origin, version, "applied remote entry");
            }
            ApplyOutcome::Rejected(reason) => {
                debug!(%session_id, %origin, version, ?reason, "rejected remote entry");
                return;
            }
        }

        match self.clipboard.write_text(&entry.content) {
            Ok(()) => self.remember_write_back(&entry.content),
            Err(err) => warn!(error = %err, "failed to write clipboard"),
        }
        self.log_segments(&entry.content);

        if let Err(err) = self.registry.send_to(&session_id, Message::Ack(version)).await {
            debug!(%session_id, error = %err, "ack not sent");
        }

        let mut excluding: HashSet<SessionId> = self
            .registry
            .snapshot()
            .await
            .into_iter()
            .filter(|handle| handle.peer_node_id() == &origin)
            .map(|handle| handle.id().clone())
            .collect();
        excluding.insert(session_id);

        let report = self
            .registry
            .broadcast(&Message::Update(entry), &excluding)
            .await;
        log_report(&report);
    }

    async fn on_lost(&mut self, session_id: SessionId, node_id: NodeId, reason: CloseReason) {
        self.registry.unregister(&session_id).await;
        let ack = self.state.forget_peer(&session_id);
        info!(
            %session_id,
            peer = %node_id,
            %reason,
            acked_version = ack.map(|a| a.acked_version),
            "peer disconnected"
        );
    }

    fn remember_write_back(&mut self, content: &str) {
        let hash = content_hash(content);
        if self.written_back.contains(&hash) {
            return;
        }
        if self.written_back.len() == WRITE_BACK_MEMORY {
            self.written_back.pop_front();
        }
        self.written_back.push_back(hash);
    }

    fn log_segments(&self, text: &str) {
        let Some(segmenter) = &self.segmenter else {
            return;
        };
        let tokens = segmenter.segment(text);
        let japanese = tokens.iter().filter(|t| t.script.is_japanese()).count();
        debug!(
            tokens = tokens.len(),
            japanese,
            segments = ?tokens.iter().map(|t| t.surface.as_str()).collect::<Vec<_>>(),
            "segmented entry"
        );
    }
}

fn log_report(report: &BroadcastReport) {
    for (session_id, err) in &report.failed {
        warn!(%session_id, error = %err, "skipped peer during broadcast");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tc_core::ports::ClockPort;
    use tc_core::{ClipboardStateStore, SessionState};
    use tc_platform::InMemoryClipboard;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct StepClock(AtomicU64);

    impl ClockPort for StepClock {
        fn now_ms(&self) -> u64 {
            self.0.fetch_add(1, Ordering::Relaxed)
        }
    }

    struct Peer {
        handle: SessionHandle,
        outbound: mpsc::Receiver<Message>,
        _state: watch::Sender<SessionState>,
    }

    impl Peer {
        fn new(session: &str, node: &str) -> Self {
            let (tx, rx) = mpsc::channel(8);
            let (state_tx, state_rx) = watch::channel(SessionState::Active);
            let handle = SessionHandle::new(
                SessionId::from(session),
                NodeId::from(node),
                None,
                tx,
                state_rx,
                CancellationToken::new(),
            );
            Self {
                handle,
                outbound: rx,
                _state: state_tx,
            }
        }

        fn drain(&mut self) -> Vec<Message> {
            let mut messages = Vec::new();
            while let Ok(message) = self.outbound.try_recv() {
                messages.push(message);
            }
            messages
        }
    }

    fn engine(node: &str) -> (SyncEngine, InMemoryClipboard) {
        let clipboard = InMemoryClipboard::new();
        let store = ClipboardStateStore::new(NodeId::from(node), Arc::new(StepClock::default()));
        let engine = SyncEngine::new(
            SyncState::new(store),
            Arc::new(PeerRegistry::new()),
            Arc::new(clipboard.clone()),
        );
        (engine, clipboard)
    }

    async fn connect(engine: &mut SyncEngine, peer: &Peer) {
        engine
            .handle(SessionEvent::Established(peer.handle.clone()).into())
            .await;
    }

    async fn receive(engine: &mut SyncEngine, peer: &Peer, message: Message) {
        engine
            .handle(
                SessionEvent::Received {
                    session_id: peer.handle.id().clone(),
                    message,
                }
                .into(),
            )
            .await;
    }

    #[tokio::test]
    async fn test_local_change_broadcasts_to_every_peer() {
        let (mut engine, _clipboard) = engine("a");
        let mut b = Peer::new("s-b", "b");
        let mut c = Peer::new("s-c", "c");
        connect(&mut engine, &b).await;
        connect(&mut engine, &c).await;

        engine.handle(EngineEvent::LocalChange("hello".into())).await;

        for peer in [&mut b, &mut c] {
            match peer.drain().as_slice() {
                [Message::Update(entry)] => {
                    assert_eq!(entry.content, "hello");
                    assert_eq!(entry.version, 1);
                    assert_eq!(entry.origin_id, NodeId::from("a"));
                }
                other => panic!("unexpected outbound: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_local_echo_is_ignored() {
        let (mut engine, _clipboard) = engine("a");
        let mut b = Peer::new("s-b", "b");
        connect(&mut engine, &b).await;

        engine.handle(EngineEvent::LocalChange("same".into())).await;
        engine.handle(EngineEvent::LocalChange("same".into())).await;

        assert_eq!(b.drain().len(), 1);
        assert_eq!(engine.state().current().version, 1);
    }

    #[tokio::test]
    async fn test_applied_update_is_acked_and_forwarded_past_origin() {
        let (mut engine, clipboard) = engine("b");
        let mut from = Peer::new("s-1", "c");
        let mut origin = Peer::new("s-2", "a");
        let mut other = Peer::new("s-3", "d");
        for peer in [&from, &origin, &other] {
            connect(&mut engine, peer).await;
        }

        let entry = ClipboardEntry::new("copied on a", 1, NodeId::from("a"), 10);
        receive(&mut engine, &from, Message::Update(entry.clone())).await;

        assert_eq!(clipboard.read_text().unwrap().as_deref(), Some("copied on a"));
        assert_eq!(from.drain(), vec![Message::Ack(1)]);
        assert!(origin.drain().is_empty());
        assert_eq!(other.drain(), vec![Message::Update(entry)]);
    }

    #[tokio::test]
    async fn test_rejected_update_ends_propagation() {
        let (mut engine, clipboard) = engine("b");
        let mut from = Peer::new("s-1", "a");
        let mut other = Peer::new("s-2", "c");
        connect(&mut engine, &from).await;
        connect(&mut engine, &other).await;

        engine.handle(EngineEvent::LocalChange("newer".into())).await;
        engine.handle(EngineEvent::LocalChange("newest".into())).await;
        from.drain();
        other.drain();

        let stale = ClipboardEntry::new("old", 1, NodeId::from("a"), 0);
        receive(&mut engine, &from, Message::Update(stale)).await;

        assert!(from.drain().is_empty());
        assert!(other.drain().is_empty());
        assert_eq!(clipboard.read_text().unwrap(), None);
        assert_eq!(engine.state().current().content, "newest");
    }

    #[tokio::test]
    async fn test_late_write_back_of_superseded_value_is_ignored() {
        let (mut engine, clipboard) = engine("b");
        let mut a = Peer::new("s-a", "a");
        connect(&mut engine, &a).await;

        let z = ClipboardEntry::new("z", 1, NodeId::from("a"), 1);
        let w = ClipboardEntry::new("w", 2, NodeId::from("a"), 2);
        receive(&mut engine, &a, Message::Update(z)).await;
        receive(&mut engine, &a, Message::Update(w)).await;
        // The watcher reports the first write only after the second landed.
        engine.handle(EngineEvent::LocalChange("z".into())).await;

        let current = engine.state().current();
        assert_eq!(current.content, "w");
        assert_eq!(current.version, 2);
        assert_eq!(a.drain(), vec![Message::Ack(1), Message::Ack(2)]);
        assert_eq!(clipboard.read_text().unwrap().as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn test_user_copy_after_write_back_is_sent() {
        let (mut engine, _clipboard) = engine("b");
        let mut a = Peer::new("s-a", "a");
        connect(&mut engine, &a).await;

        let z = ClipboardEntry::new("z", 1, NodeId::from("a"), 1);
        receive(&mut engine, &a, Message::Update(z)).await;
        engine.handle(EngineEvent::LocalChange("z".into())).await;
        engine.handle(EngineEvent::LocalChange("mine".into())).await;
        a.drain();

        // Once the user has copied something, older write-backs are forgotten.
        engine.handle(EngineEvent::LocalChange("z".into())).await;

        let current = engine.state().current();
        assert_eq!(current.content, "z");
        assert_eq!(current.version, 3);
        assert_eq!(current.origin_id, NodeId::from("b"));
        assert_eq!(a.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_acks_are_recorded_in_status() {
        let (mut engine, _clipboard) = engine("a");
        let b = Peer::new("s-b", "b");
        connect(&mut engine, &b).await;
        let status = engine.subscribe();

        engine.handle(EngineEvent::LocalChange("x".into())).await;
        receive(&mut engine, &b, Message::Ack(1)).await;
        receive(&mut engine, &b, Message::Ack(0)).await;

        let status = status.borrow().clone();
        assert_eq!(status.current_version, 1);
        assert_eq!(status.peers.len(), 1);
        assert_eq!(status.peers[0].acked_version, 1);
        assert_eq!(status.peers[0].behind, 0);
    }

    #[tokio::test]
    async fn test_new_peer_receives_current_entry() {
        let (mut engine, _clipboard) = engine("a");
        engine.handle(EngineEvent::LocalChange("before you came".into())).await;

        let mut late = Peer::new("s-late", "late");
        connect(&mut engine, &late).await;

        match late.drain().as_slice() {
            [Message::Update(entry)] => assert_eq!(entry.content, "before you came"),
            other => panic!("unexpected outbound: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_node_sends_nothing_to_new_peer() {
        let (mut engine, _clipboard) = engine("a");
        let mut b = Peer::new("s-b", "b");
        connect(&mut engine, &b).await;
        assert!(b.drain().is_empty());
    }

    #[tokio::test]
    async fn test_lost_peer_is_forgotten() {
        let (mut engine, _clipboard) = engine("a");
        let b = Peer::new("s-b", "b");
        connect(&mut engine, &b).await;

        engine
            .handle(
                SessionEvent::Lost {
                    session_id: b.handle.id().clone(),
                    node_id: NodeId::from("b"),
                    reason: CloseReason::PeerBye,
                }
                .into(),
            )
            .await;

        assert_eq!(engine.state().peer_count(), 0);
        assert!(engine.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropped_peer_does_not_abort_broadcast() {
        let (mut engine, _clipboard) = engine("a");
        let b = Peer::new("s-b", "b");
        let mut c = Peer::new("s-c", "c");
        connect(&mut engine, &b).await;
        connect(&mut engine, &c).await;
        drop(b.outbound);

        engine.handle(EngineEvent::LocalChange("still delivered".into())).await;

        assert_eq!(c.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (engine, _clipboard) = engine("a");
        let (handle, rx) = SyncEngine::channel(4);
        let task = tokio::spawn(engine.run(rx));

        handle.local_change("x").await.unwrap();
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(handle.is_closed());
    }
}
