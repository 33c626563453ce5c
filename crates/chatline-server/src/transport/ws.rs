//! WebSocket connection handler.
//!
//! One task per connection, moving through three phases:
//! - Authenticating: every frame must be a login request; rejections are
//!   answered inline and the phase does not change
//! - Active: chat messages get the session's name stamped as sender and go to
//!   the hub for routing; other kinds are ignored
//! - Closed: the session is unregistered and the socket released
//!
//! The task also drains its outbound queue (frames pushed by the hub), answers
//! pings, sends its own pings, and closes once `server.max_session_secs` has
//! elapsed.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn, Instrument, Span};

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::{validate_username, Envelope, LoginResponse, Payload};

use crate::app_state::AppState;
use crate::hub::{Connection, SessionId};
use crate::transport::codec::{decode, encode, Inbound};

#[derive(Debug)]
enum Phase {
    Authenticating,
    Active { id: SessionId, name: String },
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    ws: WebSocketUpgrade,
) -> Response {
    let peer = peer
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    ws.on_upgrade(move |socket| {
        let span = tracing::info_span!("session", peer = %peer, user = tracing::field::Empty);
        async move {
            match run_session(app, socket).await {
                Ok(()) => debug!("connection closed"),
                Err(e) => {
                    debug!(error = %e, class = e.class().as_str(), "connection closed with error")
                }
            }
        }
        .instrument(span)
    })
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, socket: WebSocket) -> Result<()> {
    let cfg = app.cfg();
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(cfg.hub.outbound_queue);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = cfg.server.ping_interval();
    let mut ping_tick = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = tokio::time::sleep(cfg.server.max_session());
    tokio::pin!(deadline);

    let mut phase = Phase::Authenticating;

    let outcome = loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break Ok(()); };
                if let Err(e) = ws_tx.send(m).await {
                    break Err(ChatError::Transport(format!("write failed: {e}")));
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break Ok(()); };
                let msg = match incoming {
                    Ok(m) => m,
                    Err(e) => break Err(ChatError::Transport(format!("read failed: {e}"))),
                };

                match decode(msg) {
                    Ok(Inbound::Envelope(env)) => {
                        let next = match &phase {
                            Phase::Authenticating => authenticate(&app, &out_tx, &env).await,
                            Phase::Active { name, .. } => {
                                relay(&app, name, &env).await.map(|()| None)
                            }
                        };
                        match next {
                            Ok(Some(active)) => {
                                if let Phase::Active { name, .. } = &active {
                                    Span::current().record("user", name.as_str());
                                }
                                phase = active;
                            }
                            Ok(None) => {}
                            Err(e) => break Err(e),
                        }
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.try_send(Message::Pong(payload));
                    }
                    Ok(Inbound::Pong) => {}
                    Ok(Inbound::Close) => break Ok(()),
                    Err(e) => match phase {
                        Phase::Authenticating => {
                            debug!(error = %e, "undecodable frame before login");
                            if let Err(e) = reject(&out_tx, &ChatError::ExpectedLogin) {
                                break Err(e);
                            }
                        }
                        Phase::Active { .. } => break Err(e),
                    },
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.try_send(Message::Ping(Vec::new()));
            }

            // lifetime bound
            _ = &mut deadline => {
                debug!("session lifetime exceeded");
                break Ok(());
            }
        }
    };

    if let Phase::Active { id, .. } = phase {
        if let Err(e) = app.hub().unregister(id).await {
            warn!(error = %e, "unregister failed");
        }
    }
    let _ = ws_tx.close().await;

    outcome
}

/// Handle one frame while authenticating. Returns the next phase on success.
async fn authenticate(
    app: &AppState,
    out_tx: &mpsc::Sender<Message>,
    env: &Envelope,
) -> Result<Option<Phase>> {
    let req = match env.decode() {
        Ok(Payload::LoginRequest(req)) => req,
        Ok(other) => {
            debug!(kind = other.kind().as_str(), "expected login request");
            reject(out_tx, &ChatError::ExpectedLogin)?;
            return Ok(None);
        }
        Err(e) => {
            debug!(error = %e, "undecodable login frame");
            reject(out_tx, &ChatError::ExpectedLogin)?;
            return Ok(None);
        }
    };

    let name = match validate_username(&req.username) {
        Ok(name) => name.to_string(),
        Err(e) => {
            reject(out_tx, &e)?;
            return Ok(None);
        }
    };

    let hub = app.hub();
    if hub.is_name_taken(&name).await? {
        reject(out_tx, &ChatError::NameTaken)?;
        return Ok(None);
    }

    // The hub re-checks the name; a concurrent login may have won in between.
    let session = hub.new_session(name.clone(), Connection::new(out_tx.clone()));
    let id = session.id;
    match hub.register(session).await {
        Ok(()) => Ok(Some(Phase::Active { id, name })),
        Err(ChatError::NameTaken) => {
            reject(out_tx, &ChatError::NameTaken)?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Handle one frame while active.
async fn relay(app: &AppState, name: &str, env: &Envelope) -> Result<()> {
    match env.decode() {
        Ok(Payload::Chat(mut msg)) => {
            msg.sender = name.to_string();
            let to = msg.destination.to_string();
            let delivered = app.hub().route(msg).await?;
            debug!(to = %to, delivered, "chat routed");
            Ok(())
        }
        Ok(other) => {
            debug!(kind = other.kind().as_str(), "ignored while active");
            Ok(())
        }
        Err(ChatError::UnknownKind(kind)) => {
            warn!(kind = %kind, "unknown envelope kind dropped");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn reject(out_tx: &mpsc::Sender<Message>, reason: &ChatError) -> Result<()> {
    debug!(reason = %reason, class = reason.class().as_str(), "login rejected");
    let msg = encode(&Payload::LoginResponse(LoginResponse::rejected(reason.to_string())))?;
    out_tx
        .try_send(msg)
        .map_err(|_| ChatError::Transport("outbound queue unavailable".into()))
}
