//! Envelope (`{"type": ..., "data": ...}`).
//!
//! `data` is stored as `RawValue` so the kind can be inspected before the body
//! is parsed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{ChatError, Result};
use crate::protocol::payload::Payload;

/// The four recognized envelope kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    LoginRequest,
    LoginResponse,
    ChatMessage,
    UserListUpdate,
}

impl Kind {
    pub const ALL: [Kind; 4] = [
        Kind::LoginRequest,
        Kind::LoginResponse,
        Kind::ChatMessage,
        Kind::UserListUpdate,
    ];

    /// Wire name (the `type` field).
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::LoginRequest => "login_request",
            Kind::LoginResponse => "login_response",
            Kind::ChatMessage => "chat_message",
            Kind::UserListUpdate => "user_list_update",
        }
    }

    pub fn from_wire(s: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// One wire unit. Text frame <-> `Envelope` <-> [`Payload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Kind-specific body, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Envelope {
    /// Wrap a typed payload. The kind is taken from the payload variant.
    pub fn encode(payload: &Payload) -> Result<Self> {
        let data = match payload {
            Payload::LoginRequest(p) => to_raw(p)?,
            Payload::LoginResponse(p) => to_raw(p)?,
            Payload::Chat(p) => to_raw(p)?,
            Payload::Roster(p) => to_raw(p)?,
        };
        Ok(Self {
            msg_type: payload.kind().as_str().to_string(),
            data: Some(data),
        })
    }

    /// Resolve the kind without touching `data`.
    pub fn kind(&self) -> Result<Kind> {
        Kind::from_wire(&self.msg_type).ok_or_else(|| ChatError::UnknownKind(self.msg_type.clone()))
    }

    /// Parse `data` as the type implied by the kind.
    pub fn decode(&self) -> Result<Payload> {
        let kind = self.kind()?;
        let raw = self.data.as_deref().map(RawValue::get).unwrap_or("null");
        match kind {
            Kind::LoginRequest => parse(kind, raw).map(Payload::LoginRequest),
            Kind::LoginResponse => parse(kind, raw).map(Payload::LoginResponse),
            Kind::ChatMessage => parse(kind, raw).map(Payload::Chat),
            Kind::UserListUpdate => parse(kind, raw).map(Payload::Roster),
        }
    }

    /// Parse one text frame.
    pub fn from_text(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| ChatError::MalformedPayload(format!("invalid envelope json: {e}")))
    }

    /// Serialize to one text frame.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ChatError::Internal(format!("envelope encode failed: {e}")))
    }
}

fn to_raw<T: Serialize>(value: &T) -> Result<Box<RawValue>> {
    serde_json::value::to_raw_value(value)
        .map_err(|e| ChatError::Internal(format!("payload encode failed: {e}")))
}

fn parse<T: DeserializeOwned>(kind: Kind, raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| ChatError::MalformedPayload(format!("{}: {e}", kind.as_str())))
}
