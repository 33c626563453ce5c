//! Typed envelope bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::envelope::{Envelope, Kind};
use crate::protocol::identity::BROADCAST;

/// Decoded envelope body, one variant per [`Kind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    LoginRequest(LoginRequest),
    LoginResponse(LoginResponse),
    Chat(ChatMessage),
    Roster(RosterSnapshot),
}

impl Payload {
    pub fn kind(&self) -> Kind {
        match self {
            Payload::LoginRequest(_) => Kind::LoginRequest,
            Payload::LoginResponse(_) => Kind::LoginResponse,
            Payload::Chat(_) => Kind::ChatMessage,
            Payload::Roster(_) => Kind::UserListUpdate,
        }
    }

    /// Encode straight to a text frame.
    pub fn to_text(&self) -> Result<String> {
        Envelope::encode(self)?.to_text()
    }

    /// Decode straight from a text frame.
    pub fn from_text(s: &str) -> Result<Self> {
        Envelope::from_text(s)?.decode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "success")]
    pub accepted: bool,
    #[serde(rename = "message", default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

impl LoginResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: "Login successful".into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}

/// A chat line. `sender` is assigned by the server; whatever the client puts
/// there is overwritten before routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "username", default)]
    pub sender: String,
    pub destination: Destination,
    #[serde(rename = "message")]
    pub body: String,
}

impl ChatMessage {
    /// Outgoing message as composed by a client (sender left blank).
    pub fn outgoing(destination: Destination, body: impl Into<String>) -> Self {
        Self {
            sender: String::new(),
            destination,
            body: body.into(),
        }
    }
}

/// Current membership, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterSnapshot {
    #[serde(rename = "users")]
    pub members: Vec<String>,
}

/// Where a chat message goes: everyone, or one named peer.
///
/// On the wire this is a plain string; `"ALL"` is the broadcast sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    All,
    Peer(String),
}

impl Destination {
    pub fn peer(name: impl Into<String>) -> Self {
        Destination::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Destination::All => BROADCAST,
            Destination::Peer(name) => name,
        }
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        if s == BROADCAST {
            Destination::All
        } else {
            Destination::Peer(s)
        }
    }
}

impl From<Destination> for String {
    fn from(d: Destination) -> Self {
        match d {
            Destination::All => BROADCAST.to_string(),
            Destination::Peer(name) => name,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
