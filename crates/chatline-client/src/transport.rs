//! Client side of the websocket: dial, write one payload, read one payload.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::{Envelope, Payload};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsWriter = SplitSink<WsStream, Message>;
pub type WsReader = SplitStream<WsStream>;

pub async fn dial(url: &str, within: Duration) -> Result<WsStream> {
    let (ws, _resp) = tokio::time::timeout(within, connect_async(url))
        .await
        .map_err(|_| ChatError::Transport(format!("dial {url} timed out")))?
        .map_err(|e| ChatError::Transport(format!("dial {url} failed: {e}")))?;
    debug!(%url, "connected");
    Ok(ws)
}

pub async fn write(writer: &mut WsWriter, payload: &Payload) -> Result<()> {
    let text = payload.to_text()?;
    writer
        .send(Message::Text(text))
        .await
        .map_err(|e| ChatError::Transport(format!("write failed: {e}")))
}

/// Read until one envelope decodes. Frames that fail to decode are dropped;
/// only the end of the stream is an error.
pub async fn read_payload(reader: &mut WsReader) -> Result<Payload> {
    loop {
        let msg = match reader.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(ChatError::Transport(format!("read failed: {e}"))),
            None => return Err(ChatError::Transport("connection closed".into())),
        };
        match msg {
            Message::Text(s) => match Envelope::from_text(&s).and_then(|env| env.decode()) {
                Ok(payload) => return Ok(payload),
                Err(e) => warn!(error = %e, class = e.class().as_str(), "dropped inbound frame"),
            },
            Message::Close(_) => return Err(ChatError::Transport("connection closed".into())),
            _ => {}
        }
    }
}
