//! Sessions: one TCP connection from handshake to close.
//!
//! A [`Session`] is driven directly (`handshake`, `send`, `next_message`)
//! until it is handed to [`runtime::spawn`], which moves it into its own
//! task and returns a [`SessionHandle`].

mod config;
mod event;
mod handle;
pub mod runtime;

pub use config::SessionConfig;
pub use event::{CloseReason, SessionEvent};
pub use handle::SessionHandle;

use std::fmt;
use std::net::SocketAddr;

use tc_core::{Hello, Message, NodeId, SessionId, SessionState};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::error::{ProtocolError, SessionError};
use crate::framing::FramedTransport;
use crate::wire;

/// Which side of the handshake this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dialed out; speaks first.
    Initiator,
    /// Accepted; answers the initiator's `Hello`.
    Responder,
}

impl Role {
    fn id_prefix(self) -> &'static str {
        match self {
            Self::Initiator => "out",
            Self::Responder => "in",
        }
    }
}

pub struct Session<S> {
    id: SessionId,
    role: Role,
    state: SessionState,
    peer: Option<Hello>,
    peer_addr: Option<SocketAddr>,
    transport: FramedTransport<S>,
    last_heartbeat_at: Instant,
    config: SessionConfig,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("peer", &self.peer)
            .field("peer_addr", &self.peer_addr)
            .finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S, role: Role, peer_addr: Option<SocketAddr>, config: SessionConfig) -> Self {
        let prefix = match peer_addr {
            Some(addr) => format!("{}-{}", role.id_prefix(), addr),
            None => role.id_prefix().to_string(),
        };

        Self {
            id: SessionId::generate(&prefix),
            role,
            state: SessionState::Connecting,
            peer: None,
            peer_addr,
            transport: FramedTransport::new(io, config.max_frame_bytes),
            last_heartbeat_at: Instant::now(),
            config,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// The peer's greeting, once the handshake has completed.
    pub fn peer(&self) -> Option<&Hello> {
        self.peer.as_ref()
    }

    pub fn peer_node_id(&self) -> NodeId {
        self.peer
            .as_ref()
            .map(|hello| hello.node_id.clone())
            .unwrap_or_default()
    }

    /// Time the last message of any kind arrived.
    pub fn last_heartbeat_at(&self) -> Instant {
        self.last_heartbeat_at
    }

    /// Exchange `Hello` with the peer.
    ///
    /// The initiator greets first, the responder always answers with its own
    /// greeting before checking versions, so both sides learn about a
    /// mismatch. On any failure the connection is closed.
    pub async fn handshake(&mut self) -> Result<&Hello, SessionError> {
        self.state = self
            .state
            .start_handshake()
            .ok_or(ProtocolError::Unexpected("hello"))?;

        let timeout = self.config.handshake_timeout;
        let outcome = match time::timeout(timeout, self.exchange_hello()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::HandshakeTimeout(timeout)),
        };

        match outcome {
            Ok(hello) => {
                debug!(
                    session_id = %self.id,
                    peer = %hello.node_id,
                    protocol_version = hello.protocol_version,
                    "handshake complete"
                );
                self.last_heartbeat_at = Instant::now();
                self.state = self
                    .state
                    .on_handshake_complete()
                    .unwrap_or(SessionState::Active);
                let hello: &Hello = self.peer.insert(hello);
                Ok(hello)
            }
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "handshake failed");
                self.close().await;
                Err(err)
            }
        }
    }

    async fn exchange_hello(&mut self) -> Result<Hello, SessionError> {
        let local = Message::Hello(Hello {
            node_id: self.config.node_id.clone(),
            protocol_version: self.config.protocol_version,
        });

        let remote = match self.role {
            Role::Initiator => {
                self.write(&local).await?;
                self.read_hello().await?
            }
            Role::Responder => {
                let remote = self.read_hello().await?;
                self.write(&local).await?;
                remote
            }
        };

        if remote.protocol_version != self.config.protocol_version {
            return Err(SessionError::IncompatiblePeer {
                node_id: remote.node_id,
                local: self.config.protocol_version,
                remote: remote.protocol_version,
            });
        }
        Ok(remote)
    }

    async fn read_hello(&mut self) -> Result<Hello, SessionError> {
        let frame = self.transport.receive().await?;
        match wire::decode_message(&frame)? {
            Message::Hello(hello) => Ok(hello),
            other => Err(ProtocolError::Unexpected(other.kind()).into()),
        }
    }

    async fn write(&mut self, message: &Message) -> Result<(), SessionError> {
        let payload = wire::encode_message(message)?;
        self.transport.send(payload).await?;
        Ok(())
    }

    /// Send one message, bounded by the configured send timeout.
    pub async fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed);
        }
        let timeout = self.config.send_timeout;
        match time::timeout(timeout, self.write(message)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::SendTimeout(timeout)),
        }
    }

    /// Wait for the next message of any kind.
    ///
    /// Fails with [`SessionError::HeartbeatTimeout`] when nothing has arrived
    /// within the liveness window. Cancel-safe.
    pub async fn next_message(&mut self) -> Result<Message, SessionError> {
        let liveness = self.config.liveness_timeout();
        let deadline = self.last_heartbeat_at.checked_add(liveness);
        let expired = async move {
            match deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            frame = self.transport.receive() => {
                let frame = frame?;
                self.last_heartbeat_at = Instant::now();
                Ok(wire::decode_message(&frame)?)
            }
            _ = expired => Err(SessionError::HeartbeatTimeout(liveness)),
        }
    }

    /// Release the connection. Idempotent.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = self.state.close();

        // Shutdown is best-effort; a stalled peer must not hold us here.
        let _ = time::timeout(self.config.send_timeout, self.transport.close()).await;
        self.state = self.state.on_closed();
    }

    /// Send `Bye`, then close.
    pub async fn say_goodbye(&mut self) {
        if self.state.is_active() {
            if let Err(err) = self.send(&Message::Bye).await {
                debug!(session_id = %self.id, error = %err, "bye not delivered");
            }
        }
        self.close().await;
    }
}
