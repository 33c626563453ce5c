//! Session hub: the single authority over who is connected.
//!
//! The membership list lives inside one tokio task ([`registry`]). Every
//! register, unregister, route and name check is a request sent to that task
//! and answered over a oneshot, so the list is never shared or locked. Callers
//! only ever hold a cloneable [`HubHandle`].

mod handle;
mod outgoing;
mod registry;
mod session;

pub use handle::HubHandle;
pub use outgoing::PreparedMsg;
pub use session::{Connection, DeliveryFailure, Session, SessionId};
