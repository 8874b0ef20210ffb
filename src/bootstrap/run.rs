//! Top-level run loop of a node.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tc_app::{SyncEngine, SyncEngineHandle};
use tc_core::config::NetworkMode;
use tc_core::sync::SyncStatus;
use tc_network::{PeerRegistry, SessionManager};
use tc_platform::ClipboardWatcher;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use super::config::Settings;
use super::wiring;

/// Run until Ctrl-C.
///
/// Fails only if the node cannot start: the listener cannot bind, the
/// initial connection cannot be made, or the clipboard cannot be opened.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let node = start(settings, cancel.clone()).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");

    node.shutdown(cancel).await;
    Ok(())
}

/// A started node: every task is running.
pub struct RunningNode {
    handle: SyncEngineHandle,
    registry: Arc<PeerRegistry>,
    status: watch::Receiver<SyncStatus>,
    engine: tokio::task::JoinHandle<()>,
    drain_timeout: Duration,
    local_addr: Option<SocketAddr>,
}

impl RunningNode {
    pub fn handle(&self) -> &SyncEngineHandle {
        &self.handle
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Address the listener is bound to, in listen mode.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Close every session with a `Bye`, then stop the engine.
    pub async fn shutdown(self, cancel: CancellationToken) {
        let sessions = self.registry.snapshot().await;
        cancel.cancel();

        let drained = time::timeout(self.drain_timeout, async {
            for session in &sessions {
                session.closed().await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("some sessions did not close in time");
        }

        if self.handle.shutdown().await.is_err() {
            warn!("sync engine already stopped");
        }
        if let Err(err) = self.engine.await {
            warn!(error = %err, "sync engine task failed");
        }
    }
}

/// Start the engine, networking, the clipboard watcher and status logging.
pub async fn start(settings: Settings, cancel: CancellationToken) -> anyhow::Result<RunningNode> {
    let Settings {
        node_id,
        mode,
        config,
    } = settings;
    info!(%node_id, ?mode, "starting tcpclipboard");

    let (handle, events) = SyncEngine::channel(config.network.engine_queue_capacity);
    let backend = config.clipboard.backend;
    let clipboard = wiring::build_clipboard(backend, &handle.sender(), &cancel)?;
    let registry = Arc::new(PeerRegistry::new());
    let engine = wiring::build_engine(&node_id, &config, registry.clone(), clipboard.clone());
    let status = engine.subscribe();
    let engine_task = tokio::spawn(engine.run(events));

    let session_config = wiring::build_session_config(&node_id, &config);
    let drain_timeout = session_config.send_timeout;
    let manager = SessionManager::new(session_config, cancel.child_token());

    let mut local_addr = None;
    match mode {
        NetworkMode::Listen { port } => {
            let listener = TcpListener::bind((config.network.bind.as_str(), port))
                .await
                .with_context(|| format!("failed to bind {}:{port}", config.network.bind))?;
            local_addr = listener.local_addr().ok();
            let sender = handle.sender();
            tokio::spawn(async move { manager.serve(listener, sender).await });
        }
        NetworkMode::Connect { address } => {
            let session = manager.connect(&address).await?;
            info!(%address, peer = %session.peer_node_id(), "connected");
            let sender = handle.sender();
            let first = manager.attach(session, &sender).await;
            tokio::spawn(async move { manager.maintain(address, first, sender).await });
        }
    }

    if wiring::needs_polling(backend) {
        let watcher = ClipboardWatcher::new(
            clipboard,
            handle.sender(),
            config.clipboard.poll_interval(),
        );
        tokio::spawn(
            watcher
                .run(cancel.child_token())
                .instrument(tracing::info_span!("watcher")),
        );
    }

    if config.diagnostics.status_interval_secs > 0 {
        tokio::spawn(log_status(
            status.clone(),
            Duration::from_secs(config.diagnostics.status_interval_secs),
            cancel.child_token(),
        ));
    }

    Ok(RunningNode {
        handle,
        registry,
        status,
        engine: engine_task,
        drain_timeout,
        local_addr,
    })
}

async fn log_status(
    status: watch::Receiver<SyncStatus>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(every);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let snapshot = status.borrow().clone();
        info!(
            version = snapshot.current_version,
            origin = %snapshot.current_origin,
            peers = snapshot.peers.len(),
            lagging = snapshot.peers.iter().filter(|p| p.behind > 0).count(),
            "sync status"
        );
    }
}
