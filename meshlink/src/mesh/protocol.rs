//! Contract of the mesh registration service.

use serde::{Deserialize, Serialize};

use crate::rpc::Method;

/// Service name the registrar is reachable under.
pub const REGISTRATION_SERVICE: &str = "mesh-registry";

/// Default routing cost of an advertised service.
pub const DEFAULT_SERVICE_COST: u32 = 0;

/// One service offered by the advertising process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAd {
    /// Logical service name.
    pub name: String,
    /// Relative routing cost; lower is preferred.
    #[serde(default)]
    pub cost: u32,
}

impl ServiceAd {
    /// A service advertised at the default cost.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost: DEFAULT_SERVICE_COST,
        }
    }
}

/// Arguments of the `ad` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiseRequest {
    /// Address the advertiser accepts calls on.
    pub host_port: String,
    /// Services reachable at `host_port`.
    pub services: Vec<ServiceAd>,
}

/// Result of an accepted advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiseResponse {
    /// Number of services the registrar accepted.
    pub accepted: u32,
}

/// The registrar refused the advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("advertisement rejected: {reason}")]
pub struct RegistrationRejected {
    /// Why the advertisement was refused.
    pub reason: String,
}

crate::exception_set! {
    /// Exceptions declared by [`Advertise`].
    pub enum AdvertiseException {
        /// The registrar refused the advertisement.
        Rejected(RegistrationRejected) = "rejected",
    }
}

/// `mesh-registry::ad`: announce the caller's services.
pub struct Advertise;

impl Method for Advertise {
    const NAME: &'static str = "ad";
    type Args = AdvertiseRequest;
    type Success = AdvertiseResponse;
    type Exception = AdvertiseException;
}
