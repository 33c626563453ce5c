use std::net::SocketAddr;
use std::time::Duration;

use chatline_core::error::{ChatError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub hub: HubSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.hub.validate()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            hub: HubSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upgrade path for the websocket endpoint.
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Upper bound on one connection's lifetime (reclaims abandoned sockets).
    #[serde(default = "default_max_session_secs")]
    pub max_session_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            ping_interval_ms: default_ping_interval_ms(),
            max_session_secs: default_max_session_secs(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if !self.path.starts_with('/') {
            return Err(ChatError::Config("server.path must start with '/'".into()));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ChatError::Config(
                "server.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(60..=604800).contains(&self.max_session_secs) {
            return Err(ChatError::Config(
                "server.max_session_secs must be between 60 and 604800".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| {
                ChatError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
            })
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn max_session(&self) -> Duration {
        Duration::from_secs(self.max_session_secs)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_path() -> String {
    "/chat".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_max_session_secs() -> u64 {
    86400
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubSection {
    /// Capacity of the hub's request mailbox.
    #[serde(default = "default_mailbox")]
    pub mailbox: usize,

    /// Per-session outbound queue (frames). A full queue drops, never blocks the hub.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Re-broadcast the roster when a session leaves.
    #[serde(default = "default_roster_on_leave")]
    pub roster_on_leave: bool,
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            mailbox: default_mailbox(),
            outbound_queue: default_outbound_queue(),
            roster_on_leave: default_roster_on_leave(),
        }
    }
}

impl HubSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65536).contains(&self.mailbox) {
            return Err(ChatError::Config("hub.mailbox must be between 1 and 65536".into()));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(ChatError::Config(
                "hub.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_mailbox() -> usize {
    1024
}
fn default_outbound_queue() -> usize {
    256
}
fn default_roster_on_leave() -> bool {
    true
}
