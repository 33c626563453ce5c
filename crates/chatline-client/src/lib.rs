//! chatline client.
//!
//! The interesting part is a pure fold: [`update::update`] takes the current
//! [`model::Model`] and one [`event::Event`] and returns the next model plus
//! the [`intent::Intent`]s to perform. [`view::render`] turns a model into a
//! [`view::Screen`]. Neither touches the network or the terminal, so both are
//! tested without either.
//!
//! [`runtime`] is the effectful shell: it performs intents with
//! [`transport`], feeds the resulting events back one at a time, and draws
//! each screen with [`tui`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod event;
pub mod intent;
pub mod model;
pub mod runtime;
pub mod transport;
pub mod tui;
pub mod update;
pub mod view;
