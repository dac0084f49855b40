//! Typed RPC: method contracts, the exception union, server dispatch and
//! the client call path.

pub mod client;
pub mod context;
pub mod error;
pub mod host;
pub mod method;
pub mod outcome;
pub mod payload;
pub mod server;
pub mod transport;

pub use client::Client;
pub use context::Context;
pub use error::{CallError, DispatchError, HandlerError, RemoteErrorKind, TransportError};
pub use host::Server;
pub use method::{Exception, Method, NoException};
pub use outcome::{Outcome, WireOutcome};
pub use payload::Payload;
pub use server::{ServiceBuilder, ServiceDescriptor, ServiceDispatcher};
pub use transport::{LoopbackNetwork, Reply, Transport};
