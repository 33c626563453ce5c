use axum::extract::ws::Message;

use chatline_core::error::Result;
use chatline_core::protocol::Payload;

/// Frame serialized once and sent to N sessions.
#[derive(Debug, Clone)]
pub struct PreparedMsg(String);

impl PreparedMsg {
    pub fn prepare(payload: &Payload) -> Result<Self> {
        payload.to_text().map(PreparedMsg)
    }

    /// Convert to `axum::ws::Message` for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}
