//! Shared fixture for the integration tests.
//!
//! Builds an in-process mesh: one registrar node, one node hosting the
//! `KeyValue` and `Admin` services, and clients for both sides.

#![allow(dead_code)]

use anyhow::Result;
use meshlink::keyvalue::{admin_service, key_value_service, MemoryStore};
use meshlink::mesh::{ClientOptions, MeshClient, MeshConfig, Registrar, REGISTRATION_SERVICE};
use meshlink::peers::{PeerAddress, PeerDirectory};
use meshlink::rpc::{Client, LoopbackNetwork, Server};
use std::sync::Arc;
use std::time::Duration;

/// Registrar address.
pub const REGISTRAR: &str = "10.0.0.1:21300";
/// Address of the key-value node.
pub const KV_NODE: &str = "10.0.0.5:4040";

/// In-process mesh with a registrar and a key-value node.
pub struct MeshFixture {
    /// Network every node listens on.
    pub network: LoopbackNetwork,
    /// The registrar and its routing table.
    pub registrar: Registrar,
    /// Store behind the key-value node.
    pub store: Arc<MemoryStore>,
    /// Client whose directory is filled by hand, as a process before
    /// registration sees it.
    pub client: Client,
}

impl MeshFixture {
    /// Starts the registrar and key-value nodes.
    pub fn new() -> Result<Self> {
        let network = LoopbackNetwork::new();

        let registrar = Registrar::new(PeerDirectory::new());
        network.listen(
            PeerAddress::new(REGISTRAR)?,
            Arc::new(Server::new().with_service(registrar.service()?)),
        );

        let store = Arc::new(MemoryStore::new());
        let node = Server::new()
            .with_service(key_value_service(Arc::clone(&store))?)
            .with_service(admin_service(Arc::clone(&store))?);
        network.listen(PeerAddress::new(KV_NODE)?, Arc::new(node));

        let client = Client::new(
            Arc::new(network.clone()),
            PeerDirectory::new(),
            REGISTRATION_SERVICE,
        );

        Ok(Self {
            network,
            registrar,
            store,
            client,
        })
    }

    /// Client routed through the registrar's table.
    pub fn routed_client(&self, service: &str) -> Client {
        Client::new(
            Arc::new(self.network.clone()),
            self.registrar.directory().clone(),
            service,
        )
    }

    /// Registration controller for the key-value node.
    pub fn mesh_client(&self, options: ClientOptions) -> Result<MeshClient> {
        let config = MeshConfig::builder()
            .host_port(PeerAddress::new(KV_NODE)?)
            .initial_node(PeerAddress::new(REGISTRAR)?)
            .service("KeyValue")
            .service("Admin")
            .advertise_interval(Duration::from_secs(5))
            .build()?;
        Ok(MeshClient::new(&self.client, config, options))
    }
}
