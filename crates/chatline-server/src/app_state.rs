//! Shared application state for the chatline server.

use std::sync::Arc;

use chatline_core::error::Result;

use crate::config::ServerConfig;
use crate::hub::HubHandle;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
    hub: HubHandle,
}

impl AppState {
    /// Validate config and spawn the hub. Must run inside a tokio runtime.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        cfg.validate()?;
        let hub = HubHandle::spawn(&cfg.hub);
        Ok(Self {
            cfg: Arc::new(cfg),
            hub,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }
}
