//! Meshlink - typed RPC dispatch and mesh self-registration.
//!
//! The [`rpc`] module turns a generic "call method M on service S" transport
//! primitive into typed client calls and typed server handlers, keeping
//! declared application exceptions apart from transport failures. The
//! [`mesh`] module uses it to advertise a process to the mesh registrar and
//! keep that advertisement alive.

#![warn(clippy::pedantic)]

/// Infrastructure components (config, server, telemetry).
pub mod infrastructure;
/// Example `KeyValue` and `Admin` services.
pub mod keyvalue;
/// Mesh self-registration.
pub mod mesh;
/// Per-service peer addresses.
pub mod peers;
/// Typed call dispatch.
pub mod rpc;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
