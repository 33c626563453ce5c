//! Top-level facade crate for chatline.
//!
//! Re-exports the protocol, the server library and the client fold so users
//! can depend on a single crate.

pub mod core {
    pub use chatline_core::*;
}

pub mod server {
    pub use chatline_server::*;
}

pub mod client {
    pub use chatline_client::*;
}
