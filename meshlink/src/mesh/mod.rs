//! Mesh self-registration.
//!
//! A process announces the services it hosts to the mesh registrar with a
//! single `mesh-registry::ad` call, then keeps re-announcing on a fixed
//! interval from a background task. Repeated failures are reported through
//! the [`Handler`] and, under [`FailStrategy::Fatal`], end the cycle with
//! [`MeshError::RegistrationLost`].

pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registrar;
pub mod state;

pub use config::{MeshConfig, MeshConfigBuilder, DEFAULT_ADVERTISE_INTERVAL};
pub use controller::{
    AdvertiseHandle, ClientOptions, FailStrategy, MeshClient, StopSignal, DEFAULT_MAX_FAILURES,
    DEFAULT_TIMEOUT,
};
pub use error::MeshError;
pub use handler::{Event, Handler, NullHandler};
pub use protocol::{
    Advertise, AdvertiseException, AdvertiseRequest, AdvertiseResponse, RegistrationRejected,
    ServiceAd, REGISTRATION_SERVICE,
};
pub use registrar::Registrar;
pub use state::{RegistrationMonitor, RegistrationState, RegistrationStatus};
