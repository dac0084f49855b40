//! Registration configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::peers::{PeerAddress, ValidationError};

/// Default pause between background re-advertisements.
pub const DEFAULT_ADVERTISE_INTERVAL: Duration = Duration::from_secs(50);

/// What this process advertises and where the registrars are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Address this process accepts calls on.
    pub host_port: PeerAddress,
    /// Registrar addresses used to seed the registration service's peers.
    pub initial_nodes: Vec<PeerAddress>,
    /// Services advertised at `host_port`.
    pub services: Vec<String>,
    /// Pause between background re-advertisements.
    #[serde(with = "duration_ms", default = "default_interval")]
    pub advertise_interval: Duration,
}

fn default_interval() -> Duration {
    DEFAULT_ADVERTISE_INTERVAL
}

impl MeshConfig {
    /// Returns a builder for constructing a validated `MeshConfig`.
    #[must_use]
    pub fn builder() -> MeshConfigBuilder {
        MeshConfigBuilder::default()
    }
}

/// Builder for [`MeshConfig`].
#[derive(Debug, Default)]
pub struct MeshConfigBuilder {
    host_port: Option<PeerAddress>,
    initial_nodes: Vec<PeerAddress>,
    services: Vec<String>,
    advertise_interval: Option<Duration>,
}

impl MeshConfigBuilder {
    /// Sets the advertised address.
    #[must_use]
    pub fn host_port(mut self, host_port: PeerAddress) -> Self {
        self.host_port = Some(host_port);
        self
    }

    /// Adds a registrar address.
    #[must_use]
    pub fn initial_node(mut self, node: PeerAddress) -> Self {
        self.initial_nodes.push(node);
        self
    }

    /// Sets all registrar addresses.
    #[must_use]
    pub fn initial_nodes(mut self, nodes: Vec<PeerAddress>) -> Self {
        self.initial_nodes = nodes;
        self
    }

    /// Adds an advertised service.
    #[must_use]
    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.services.push(name.into());
        self
    }

    /// Sets the re-advertisement interval.
    #[must_use]
    pub fn advertise_interval(mut self, interval: Duration) -> Self {
        self.advertise_interval = Some(interval);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAddress`] when no `host_port` was
    /// given and [`ValidationError::NoServices`] when nothing is advertised.
    pub fn build(self) -> Result<MeshConfig, ValidationError> {
        let host_port = self.host_port.ok_or(ValidationError::EmptyAddress)?;
        if self.services.is_empty() {
            return Err(ValidationError::NoServices);
        }
        Ok(MeshConfig {
            host_port,
            initial_nodes: self.initial_nodes,
            services: self.services,
            advertise_interval: self
                .advertise_interval
                .unwrap_or(DEFAULT_ADVERTISE_INTERVAL),
        })
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
