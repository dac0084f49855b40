//! Control-plane server settings.

use serde::Deserialize;

use super::BindAddress;

/// Control-plane HTTP binding.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerSettings {
    /// The address the control plane binds to.
    #[must_use]
    pub fn bind_address(&self) -> BindAddress {
        BindAddress(self.host.clone(), self.port)
    }
}
