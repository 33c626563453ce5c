//! Side effects requested by the fold.

use std::time::Duration;

use chatline_core::protocol::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Dial the server. Answered by `Connected` or `ConnectFailed`.
    Connect,
    /// Send a login request with this candidate name.
    Login(String),
    /// Read the next envelope. Answered by `Received` or `Disconnected`.
    Listen,
    Send(ChatMessage),
    /// Close the connection.
    Disconnect,
    /// Deliver a `Tick` after the delay.
    ScheduleTick(Duration),
    /// Stop the runtime.
    Quit,
}
