//! Transport layer (WebSocket).
//!
//! Exposes the upgrade handler (one task per connection) and the codec that
//! turns websocket frames into envelopes.

pub mod codec;
pub mod ws;
