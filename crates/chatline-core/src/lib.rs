//! chatline core: wire protocol and error types shared by server and client.
//!
//! This crate defines the envelope format spoken over every connection and the
//! error surface used by the other chatline crates. It carries no transport or
//! runtime dependencies so the server, the client fold, and tests can all share
//! it.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input is
//! reported as `ChatError` so a hostile peer cannot crash the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ChatError, Result};
