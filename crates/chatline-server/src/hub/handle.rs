use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::ChatMessage;

use crate::config::HubSection;
use crate::hub::registry::{self, Command, Registry};
use crate::hub::session::{Connection, Session, SessionId};

/// Cloneable front door to the hub task. Each call is one round trip.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Command>,
    seq: Arc<AtomicU64>,
}

impl HubHandle {
    /// Spawn the hub task on the current tokio runtime.
    pub fn spawn(cfg: &HubSection) -> Self {
        let (tx, rx) = mpsc::channel(cfg.mailbox.max(1));
        tokio::spawn(registry::run(Registry::new(cfg.roster_on_leave), rx));
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Bind a name to a delivery channel under a fresh session id.
    pub fn new_session(&self, name: impl Into<String>, conn: Connection) -> Session {
        Session {
            id: self.seq.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            conn,
        }
    }

    /// Add the session and broadcast the roster. Fails with `NameTaken` if
    /// another session holds the name by the time the hub sees this request.
    pub async fn register(&self, session: Session) -> Result<()> {
        self.call(|reply| Command::Register { session, reply }).await?
    }

    /// Remove the session. Returns whether it was registered.
    pub async fn unregister(&self, id: SessionId) -> Result<bool> {
        self.call(|reply| Command::Unregister { id, reply }).await
    }

    /// Route a chat message. Returns the number of sessions it was queued for.
    pub async fn route(&self, msg: ChatMessage) -> Result<usize> {
        self.call(|reply| Command::Route { msg, reply }).await
    }

    pub async fn is_name_taken(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.call(|reply| Command::IsNameTaken { name, reply }).await
    }

    /// Current members in registration order.
    pub async fn roster(&self) -> Result<Vec<String>> {
        self.call(|reply| Command::Roster { reply }).await
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ChatError::Internal("hub stopped".into()))?;
        rx.await
            .map_err(|_| ChatError::Internal("hub dropped reply".into()))
    }
}
