//! Wire protocol: kind-tagged JSON envelopes.
//!
//! Every websocket text frame carries exactly one [`Envelope`]. The envelope
//! keeps its `data` as raw JSON so a receiver can look at the kind first and
//! only parse the body once it knows what to expect. [`Payload`] is the closed
//! set of typed bodies an envelope decodes into.
//!
//! Parsing never panics: unknown kinds surface as `ChatError::UnknownKind`,
//! bodies that do not match their kind as `ChatError::MalformedPayload`.

pub mod envelope;
pub mod identity;
pub mod payload;

pub use envelope::{Envelope, Kind};
pub use identity::{validate_username, BROADCAST, MAX_USERNAME_CHARS};
pub use payload::{ChatMessage, Destination, LoginRequest, LoginResponse, Payload, RosterSnapshot};
