//! Mesh registration settings.

use serde::Deserialize;
use std::time::Duration;

use crate::mesh::{ClientOptions, FailStrategy, MeshConfig};
use crate::peers::{PeerAddress, ValidationError};

/// Mesh registration settings, as read from configuration sources.
#[derive(Debug, Deserialize, Clone)]
pub struct MeshSettings {
    /// Address this process advertises.
    pub host_port: String,
    /// Registrar addresses.
    #[serde(default)]
    pub initial_nodes: Vec<String>,
    /// Services to advertise.
    pub services: Vec<String>,
    /// Deadline of one advertise call in milliseconds.
    pub timeout_ms: u64,
    /// Pause between re-advertisements in milliseconds.
    pub advertise_interval_ms: u64,
    /// Consecutive failures before escalating.
    pub max_failures: u32,
    /// What to do once failures reach `max_failures`.
    #[serde(default)]
    pub fail_strategy: FailStrategy,
}

impl MeshSettings {
    /// Validates the addresses and builds a [`MeshConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for malformed addresses or an empty
    /// service list.
    pub fn to_config(&self) -> Result<MeshConfig, ValidationError> {
        let mut builder = MeshConfig::builder()
            .host_port(PeerAddress::new(&self.host_port)?)
            .advertise_interval(Duration::from_millis(self.advertise_interval_ms));
        for node in &self.initial_nodes {
            builder = builder.initial_node(PeerAddress::new(node)?);
        }
        for service in &self.services {
            builder = builder.service(service.clone());
        }
        builder.build()
    }

    /// Controller options without a handler.
    #[must_use]
    pub fn to_options(&self) -> ClientOptions {
        ClientOptions::new()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_fail_strategy(self.fail_strategy)
            .with_max_failures(self.max_failures)
    }
}
