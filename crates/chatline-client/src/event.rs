//! Inputs to the fold.

use chatline_core::protocol::Payload;

/// Everything the fold reacts to. Produced by the transport, the keyboard and
/// timers, but applied strictly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected,
    ConnectFailed(String),
    /// One decoded envelope, answering the outstanding `Listen`.
    Received(Payload),
    /// The connection ended; also resolves an outstanding `Listen`.
    Disconnected(String),
    Key(Key),
    Resize { width: u16, height: u16 },
    Tick,
}

/// Keys the interface understands, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
    Up,
    Down,
    Esc,
    CtrlC,
}
