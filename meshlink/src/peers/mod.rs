//! Peer directory: routable addresses per logical service.

pub mod address;
pub mod directory;

pub use address::{PeerAddress, ValidationError};
pub use directory::{PeerDirectory, PeerList};
