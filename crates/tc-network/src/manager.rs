//! Dialing, accepting and reconnecting sessions.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectError, SessionError};
use crate::session::{runtime, Role, Session, SessionConfig, SessionEvent, SessionHandle};

/// Creates sessions for one node.
///
/// Every session task runs under a child of the manager's cancellation
/// token, so cancelling it closes all sessions with a `Bye`.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: SessionConfig,
    cancel: CancellationToken,
}

impl SessionManager {
    pub fn new(config: SessionConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Handshake over an already connected stream.
    pub async fn establish<S>(
        &self,
        io: S,
        role: Role,
        peer_addr: Option<SocketAddr>,
    ) -> Result<Session<S>, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = Session::new(io, role, peer_addr, self.config.clone());
        session.handshake().await?;
        Ok(session)
    }

    /// Dial `addr` and perform the initiator handshake.
    pub async fn connect(&self, addr: &str) -> Result<Session<TcpStream>, ConnectError> {
        let timeout = self.config.connect_timeout;
        let stream = match time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectError::Dial {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ConnectError::Timeout {
                    addr: addr.to_string(),
                    timeout,
                })
            }
        };

        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "failed to set TCP_NODELAY");
        }
        let peer_addr = stream.peer_addr().ok();

        self.establish(stream, Role::Initiator, peer_addr)
            .await
            .map_err(|source| ConnectError::Handshake {
                addr: addr.to_string(),
                source,
            })
    }

    /// Accept one connection and perform the responder handshake.
    pub async fn accept(&self, listener: &TcpListener) -> Result<Session<TcpStream>, SessionError> {
        let (stream, peer_addr) = listener.accept().await?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "failed to set TCP_NODELAY");
        }
        self.establish(stream, Role::Responder, Some(peer_addr)).await
    }

    /// Start the session task; `Established` is queued before this returns.
    pub async fn attach<S, E>(&self, session: Session<S>, events: &mpsc::Sender<E>) -> SessionHandle
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        E: From<SessionEvent> + Send + 'static,
    {
        runtime::spawn(session, events.clone(), self.cancel.child_token()).await
    }

    /// Accept loop. Each connection handshakes in its own task, so a slow
    /// or hostile peer never blocks `accept`. Returns on cancellation.
    pub async fn serve<E>(&self, listener: TcpListener, events: mpsc::Sender<E>)
    where
        E: From<SessionEvent> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "accepting peers");
        }

        loop {
            let accepted = tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };

            let manager = self.clone();
            let events = events.clone();
            tokio::spawn(async move {
                if let Err(err) = stream.set_nodelay(true) {
                    debug!(error = %err, "failed to set TCP_NODELAY");
                }
                let handshake = manager.establish(stream, Role::Responder, Some(peer_addr));
                let session = tokio::select! {
                    _ = manager.cancel.cancelled() => return,
                    session = handshake => session,
                };
                match session {
                    Ok(session) => {
                        manager.attach(session, &events).await;
                    }
                    Err(err) => warn!(%peer_addr, error = %err, "rejected peer"),
                }
            });
        }

        debug!("accept loop stopped");
    }

    /// Keep a dialled session alive.
    ///
    /// Waits for `current` to close, then re-dials `addr` every
    /// `reconnect_interval` until it succeeds, and repeats. Stops on
    /// cancellation or when the peer turns out to speak another protocol
    /// version.
    pub async fn maintain<E>(&self, addr: String, mut current: SessionHandle, events: mpsc::Sender<E>)
    where
        E: From<SessionEvent> + Send + 'static,
    {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = current.closed() => {}
            }
            info!(%addr, "connection lost, reconnecting");

            current = loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => return,
                    _ = time::sleep(self.config.reconnect_interval) => {}
                }

                match self.connect(&addr).await {
                    Ok(session) => {
                        info!(%addr, peer = %session.peer_node_id(), "reconnected");
                        break self.attach(session, &events).await;
                    }
                    Err(ConnectError::Handshake { source, .. }) if source.is_incompatible_peer() => {
                        error!(%addr, error = %source, "giving up on peer");
                        return;
                    }
                    Err(err) => debug!(error = %err, "reconnect attempt failed"),
                }
            };
        }
    }
}
