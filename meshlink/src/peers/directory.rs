//! Per-service peer membership.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::address::PeerAddress;

/// Known peers for every logical service.
///
/// Cloning yields another handle onto the same table. Inserts are idempotent
/// and there is no removal; readers get snapshots and must tolerate the set
/// growing between snapshot and use.
#[derive(Clone, Default)]
pub struct PeerDirectory {
    services: Arc<RwLock<HashMap<String, BTreeSet<PeerAddress>>>>,
}

impl PeerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `address` to the peer set of `service`.
    ///
    /// Returns `true` if the address was not already known.
    pub fn add(&self, service: &str, address: PeerAddress) -> bool {
        let mut services = self.services.write();
        let inserted = services
            .entry(service.to_string())
            .or_default()
            .insert(address.clone());
        if inserted {
            debug!(service, peer = %address, "Peer added");
        }
        inserted
    }

    /// Returns a snapshot of the peers of `service`, sorted by address.
    #[must_use]
    pub fn peers(&self, service: &str) -> Vec<PeerAddress> {
        let services = self.services.read();
        services
            .get(service)
            .map(|peers| peers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the names of all services with at least one peer, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        let services = self.services.read();
        let mut names: Vec<String> = services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns a handle scoped to a single service.
    #[must_use]
    pub fn service(&self, name: &str) -> PeerList {
        PeerList {
            directory: self.clone(),
            service: Arc::from(name),
        }
    }
}

/// The peers of one service, as a handle onto a [`PeerDirectory`].
#[derive(Clone)]
pub struct PeerList {
    directory: PeerDirectory,
    service: Arc<str>,
}

impl PeerList {
    /// Service this list belongs to.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Adds a peer; returns `true` if it was new.
    pub fn add(&self, address: PeerAddress) -> bool {
        self.directory.add(&self.service, address)
    }

    /// Snapshot of the current peers.
    #[must_use]
    pub fn peers(&self) -> Vec<PeerAddress> {
        self.directory.peers(&self.service)
    }

    /// Number of known peers.
    #[must_use]
    pub fn len(&self) -> usize {
        let services = self.directory.services.read();
        services.get(&*self.service).map_or(0, BTreeSet::len)
    }

    /// Returns `true` if no peer is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
