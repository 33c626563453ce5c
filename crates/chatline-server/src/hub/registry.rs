use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::{ChatMessage, Destination, LoginResponse, Payload, RosterSnapshot};

use crate::hub::outgoing::PreparedMsg;
use crate::hub::session::{Session, SessionId};

/// Requests served by the hub task, one at a time.
#[derive(Debug)]
pub(crate) enum Command {
    Register {
        session: Session,
        reply: oneshot::Sender<Result<()>>,
    },
    Unregister {
        id: SessionId,
        reply: oneshot::Sender<bool>,
    },
    Route {
        msg: ChatMessage,
        reply: oneshot::Sender<usize>,
    },
    IsNameTaken {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    Roster {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// Membership state. Only ever touched from inside [`run`].
pub(crate) struct Registry {
    members: Vec<Session>,
    roster_on_leave: bool,
}

impl Registry {
    pub(crate) fn new(roster_on_leave: bool) -> Self {
        Self {
            members: Vec::new(),
            roster_on_leave,
        }
    }

    fn is_name_taken(&self, name: &str) -> bool {
        self.members.iter().any(|s| s.name == name)
    }

    fn roster(&self) -> Vec<String> {
        self.members.iter().map(|s| s.name.clone()).collect()
    }

    /// Add a session and push the new roster to everyone, newcomer included.
    ///
    /// The accepted login response is queued on the newcomer's channel first,
    /// so the peer always sees "accepted" before its first roster.
    fn register(&mut self, session: Session) -> Result<()> {
        if self.is_name_taken(&session.name) {
            return Err(ChatError::NameTaken);
        }

        let accepted = Payload::LoginResponse(LoginResponse::accepted());
        if let Ok(prepared) = PreparedMsg::prepare(&accepted) {
            deliver(&session, &prepared);
        }

        info!(
            user = %session.name,
            id = session.id,
            members = self.members.len() + 1,
            "session registered"
        );
        self.members.push(session);
        self.broadcast_roster();
        Ok(())
    }

    /// Remove a session if present. Absent ids are not an error.
    fn unregister(&mut self, id: SessionId) -> bool {
        let Some(pos) = self.members.iter().position(|s| s.id == id) else {
            debug!(id, "unregister for unknown session");
            return false;
        };
        // Dropping the session drops the hub's sender for its queue.
        let session = self.members.remove(pos);
        info!(user = %session.name, id, members = self.members.len(), "session unregistered");
        drop(session);

        if self.roster_on_leave {
            self.broadcast_roster();
        }
        true
    }

    /// Deliver to everyone (`ALL`) or to the destination plus the sender.
    ///
    /// A direct message whose destination is not connected is dropped
    /// silently, sender echo included.
    fn route(&self, msg: ChatMessage) -> usize {
        if let Destination::Peer(peer) = &msg.destination {
            if !self.is_name_taken(peer) {
                debug!(from = %msg.sender, to = %peer, "direct message destination not connected");
                return 0;
            }
        }

        let prepared = match PreparedMsg::prepare(&Payload::Chat(msg.clone())) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "chat message encode failed");
                return 0;
            }
        };

        let mut delivered = 0;
        for s in &self.members {
            let target = match &msg.destination {
                Destination::All => true,
                Destination::Peer(peer) => s.name == *peer || s.name == msg.sender,
            };
            if target && deliver(s, &prepared) {
                delivered += 1;
            }
        }

        delivered
    }

    fn broadcast_roster(&self) {
        let snapshot = RosterSnapshot {
            members: self.roster(),
        };
        let prepared = match PreparedMsg::prepare(&Payload::Roster(snapshot)) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "roster encode failed");
                return;
            }
        };
        for s in &self.members {
            deliver(s, &prepared);
        }
    }
}

/// Non-blocking delivery; failures are logged and skipped.
fn deliver(session: &Session, prepared: &PreparedMsg) -> bool {
    match session.conn.try_deliver(prepared.to_ws_message()) {
        Ok(()) => true,
        Err(reason) => {
            warn!(
                user = %session.name,
                id = session.id,
                reason = reason.as_str(),
                "delivery dropped"
            );
            false
        }
    }
}

/// Hub loop: processes requests strictly in arrival order until every handle is gone.
pub(crate) async fn run(mut registry: Registry, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Register { session, reply } => {
                let _ = reply.send(registry.register(session));
            }
            Command::Unregister { id, reply } => {
                let _ = reply.send(registry.unregister(id));
            }
            Command::Route { msg, reply } => {
                let _ = reply.send(registry.route(msg));
            }
            Command::IsNameTaken { name, reply } => {
                let _ = reply.send(registry.is_name_taken(&name));
            }
            Command::Roster { reply } => {
                let _ = reply.send(registry.roster());
            }
        }
    }
    debug!("hub stopped");
}
