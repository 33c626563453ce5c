use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SessionId = u64;

/// One session's outbound queue sender.
#[derive(Clone, Debug)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

/// Why a frame could not be queued for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    QueueFull,
    Closed,
}

impl DeliveryFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryFailure::QueueFull => "queue_full",
            DeliveryFailure::Closed => "closed",
        }
    }
}

impl Connection {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    /// Queue a frame without waiting. A slow or dead peer never stalls the caller.
    pub fn try_deliver(&self, msg: Message) -> Result<(), DeliveryFailure> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryFailure::QueueFull,
            TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }
}

/// A logged-in identity bound to its delivery channel.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub conn: Connection,
}
