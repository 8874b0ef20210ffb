//! The task that owns an established session.

use tc_core::{Message, SessionState};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{CloseReason, Session, SessionEvent, SessionHandle};
use crate::error::{ProtocolError, SessionError};

/// Move an established session into its own task.
///
/// `Established` is queued on `events` before this returns, so the owner
/// sees it ahead of any `Received` from the same session. The task ends by
/// queueing exactly one `Lost`.
pub async fn spawn<S, E>(
    session: Session<S>,
    events: mpsc::Sender<E>,
    cancel: CancellationToken,
) -> SessionHandle
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    E: From<SessionEvent> + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::channel(session.config().outbound_capacity);
    let (state_tx, state_rx) = watch::channel(session.state());

    let handle = SessionHandle::new(
        session.id().clone(),
        session.peer_node_id(),
        session.peer_addr(),
        outbound_tx,
        state_rx,
        cancel.clone(),
    );

    let _ = events
        .send(SessionEvent::Established(handle.clone()).into())
        .await;

    let span = info_span!(
        "session",
        session_id = %session.id(),
        peer = %session.peer_node_id(),
    );
    tokio::spawn(run(session, outbound_rx, state_tx, events, cancel).instrument(span));

    handle
}

async fn run<S, E>(
    mut session: Session<S>,
    mut outbound: mpsc::Receiver<Message>,
    state: watch::Sender<SessionState>,
    events: mpsc::Sender<E>,
    cancel: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin,
    E: From<SessionEvent>,
{
    info!("session active");

    let interval = session.config().heartbeat_period();
    let mut heartbeat = time::interval_at(Instant::now() + interval, interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                session.say_goodbye().await;
                break CloseReason::Local;
            }

            queued = outbound.recv() => {
                let Some(message) = queued else {
                    session.say_goodbye().await;
                    break CloseReason::Local;
                };
                if let Err(err) = session.send(&message).await {
                    break close_reason(&err);
                }
            }

            _ = heartbeat.tick() => {
                if let Err(err) = session.send(&Message::Heartbeat).await {
                    break close_reason(&err);
                }
            }

            incoming = session.next_message() => {
                match incoming {
                    Ok(Message::Heartbeat) => {}
                    Ok(Message::Bye) => break CloseReason::PeerBye,
                    Ok(Message::Hello(_)) => {
                        break close_reason(&ProtocolError::Unexpected("hello").into());
                    }
                    Ok(message) => {
                        let event = SessionEvent::Received {
                            session_id: session.id().clone(),
                            message,
                        };
                        if events.send(event.into()).await.is_err() {
                            debug!("event queue closed");
                            session.say_goodbye().await;
                            break CloseReason::Local;
                        }
                    }
                    Err(err) => break close_reason(&err),
                }
            }
        }
    };

    state.send_replace(SessionState::Closing);
    session.close().await;
    state.send_replace(SessionState::Closed);

    if reason.is_graceful() {
        info!(%reason, "session closed");
    } else {
        warn!(%reason, "session lost");
    }

    let _ = events
        .send(
            SessionEvent::Lost {
                session_id: session.id().clone(),
                node_id: session.peer_node_id(),
                reason,
            }
            .into(),
        )
        .await;
}

fn close_reason(err: &SessionError) -> CloseReason {
    match err {
        err if err.is_eof() => CloseReason::PeerClosed,
        SessionError::HeartbeatTimeout(_) => CloseReason::HeartbeatTimeout,
        err => CloseReason::Error(err.to_string()),
    }
}
