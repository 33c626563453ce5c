//! chatline server library entry.
//!
//! Wires the config, the hub (session registry actor), and the websocket
//! connection handler into an axum router. Consumed by the binary (`main.rs`)
//! and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod hub;
pub mod router;
pub mod transport;
