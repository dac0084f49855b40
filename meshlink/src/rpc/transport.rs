//! The transport call primitive and an in-process implementation of it.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::context::Context;
use super::error::TransportError;
use super::host::Server;
use super::payload::Payload;
use crate::peers::PeerAddress;

/// What a server sends back for a call that reached a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Application-level success: `false` when the handler raised a
    /// declared exception.
    pub ok: bool,
    /// Encoded [`WireOutcome`](super::WireOutcome).
    pub body: Payload,
}

/// Delivers one call to one peer.
///
/// Implementations must be safe to call concurrently. Framing, connection
/// management and health probing all live behind this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `args` to `service::method` on `peer` and waits for the reply.
    async fn call(
        &self,
        ctx: &Context,
        peer: &PeerAddress,
        service: &str,
        method: &str,
        args: Payload,
    ) -> Result<Reply, TransportError>;
}

/// In-process network: servers "listen" on an address in a shared table and
/// calls are delivered by direct dispatch.
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    nodes: Arc<RwLock<HashMap<PeerAddress, Arc<Server>>>>,
}

impl LoopbackNetwork {
    /// Creates an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `server` to `address`, replacing whatever was there.
    pub fn listen(&self, address: PeerAddress, server: Arc<Server>) {
        info!(address = %address, services = ?server.services(), "Loopback node listening");
        self.nodes.write().insert(address, server);
    }

    /// Unbinds `address`; later calls to it are refused.
    ///
    /// Returns `true` if something was listening.
    pub fn shutdown(&self, address: &PeerAddress) -> bool {
        let removed = self.nodes.write().remove(address).is_some();
        if removed {
            info!(address = %address, "Loopback node shut down");
        }
        removed
    }

    /// Returns `true` if a server is bound to `address`.
    #[must_use]
    pub fn is_listening(&self, address: &PeerAddress) -> bool {
        self.nodes.read().contains_key(address)
    }
}

#[async_trait]
impl Transport for LoopbackNetwork {
    async fn call(
        &self,
        ctx: &Context,
        peer: &PeerAddress,
        service: &str,
        method: &str,
        args: Payload,
    ) -> Result<Reply, TransportError> {
        let server = self.nodes.read().get(peer).cloned();
        let Some(server) = server else {
            debug!(peer = %peer, service, method, "No loopback node at address");
            return Err(TransportError::ConnectionRefused {
                peer: peer.to_string(),
            });
        };
        server
            .handle(service, method, ctx.clone(), args)
            .await
            .map_err(TransportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::error::RemoteErrorKind;
    use std::time::Duration;

    #[tokio::test]
    async fn calls_to_unbound_addresses_should_be_refused() {
        let network = LoopbackNetwork::new();
        let peer = PeerAddress::new("127.0.0.1:1").unwrap();
        let err = network
            .call(
                &Context::with_timeout(Duration::from_secs(1)),
                &peer,
                "svc",
                "m",
                Payload::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::ConnectionRefused {
                peer: "127.0.0.1:1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn dispatch_errors_should_surface_as_remote_errors() {
        let network = LoopbackNetwork::new();
        let peer = PeerAddress::new("127.0.0.1:2").unwrap();
        network.listen(peer.clone(), Arc::new(Server::new()));
        assert!(network.is_listening(&peer));

        let err = network
            .call(
                &Context::with_timeout(Duration::from_secs(1)),
                &peer,
                "svc",
                "m",
                Payload::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Remote {
                kind: RemoteErrorKind::UnknownService,
                ..
            }
        ));

        assert!(network.shutdown(&peer));
        assert!(!network.shutdown(&peer));
    }
}
