//! Frame codec for the transport layer.
//!
//! - Text frames => `Envelope` (kind resolved lazily, body still raw)
//! - Binary frames are not part of the protocol and decode as malformed
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use chatline_core::{
    error::{ChatError, Result},
    protocol::{Envelope, Payload},
};

#[derive(Debug)]
pub enum Inbound {
    Envelope(Envelope),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Envelope::from_text(&s).map(Inbound::Envelope),
        Message::Binary(b) => Err(ChatError::MalformedPayload(format!(
            "binary frame ({} bytes) not supported",
            b.len()
        ))),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

pub fn encode(payload: &Payload) -> Result<Message> {
    payload.to_text().map(Message::Text)
}
