//! In-memory registrar: the server side of `mesh-registry`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::protocol::{
    Advertise, AdvertiseRequest, AdvertiseResponse, RegistrationRejected, REGISTRATION_SERVICE,
};
use crate::peers::{PeerAddress, PeerDirectory};
use crate::rpc::{DispatchError, HandlerError, ServiceBuilder, ServiceDispatcher};

/// Records advertisements and turns them into routes.
#[derive(Clone, Default)]
pub struct Registrar {
    directory: PeerDirectory,
    advertisements: Arc<AtomicU64>,
    last_seen: Arc<RwLock<HashMap<PeerAddress, DateTime<Utc>>>>,
}

impl Registrar {
    /// Creates a registrar feeding `directory`.
    #[must_use]
    pub fn new(directory: PeerDirectory) -> Self {
        Self {
            directory,
            ..Self::default()
        }
    }

    /// The routing table built from advertisements.
    #[must_use]
    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Number of accepted advertisements.
    #[must_use]
    pub fn advertisements(&self) -> u64 {
        self.advertisements.load(Ordering::Relaxed)
    }

    /// When `host_port` last advertised.
    #[must_use]
    pub fn last_seen(&self, host_port: &PeerAddress) -> Option<DateTime<Utc>> {
        self.last_seen.read().get(host_port).copied()
    }

    /// Applies one advertisement.
    ///
    /// # Errors
    ///
    /// Rejects requests with an invalid address or no services.
    pub fn accept(&self, request: &AdvertiseRequest) -> Result<AdvertiseResponse, RegistrationRejected> {
        let host_port = PeerAddress::new(&request.host_port).map_err(|e| RegistrationRejected {
            reason: e.to_string(),
        })?;
        if request.services.is_empty() {
            return Err(RegistrationRejected {
                reason: "no services advertised".to_string(),
            });
        }

        let mut accepted = 0u32;
        for ad in &request.services {
            if ad.name.trim().is_empty() {
                continue;
            }
            if self.directory.add(&ad.name, host_port.clone()) {
                info!(service = %ad.name, host_port = %host_port, cost = ad.cost, "New route");
            }
            accepted += 1;
        }
        if accepted == 0 {
            return Err(RegistrationRejected {
                reason: "no valid service names".to_string(),
            });
        }

        self.last_seen.write().insert(host_port.clone(), Utc::now());
        self.advertisements.fetch_add(1, Ordering::Relaxed);
        debug!(host_port = %host_port, accepted, "Accepted advertisement");
        Ok(AdvertiseResponse { accepted })
    }

    /// Builds the `mesh-registry` service.
    ///
    /// # Errors
    ///
    /// Only fails if the service definition itself is invalid.
    pub fn service(&self) -> Result<ServiceDispatcher, DispatchError> {
        let registrar = self.clone();
        ServiceBuilder::new(REGISTRATION_SERVICE)
            .method::<Advertise, _, _>(move |_ctx, request: AdvertiseRequest| {
                let registrar = registrar.clone();
                async move { registrar.accept(&request).map_err(HandlerError::exception) }
            })
            .build()
    }
}
