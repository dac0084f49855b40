//! Lifecycle callbacks of the registration controller.

use std::fmt;

use super::error::MeshError;

/// Registration lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The initial advertisement succeeded.
    Advertised,
    /// A background re-advertisement succeeded.
    Readvertised,
    /// The background cycle gave up after repeated failures.
    Terminated,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Advertised => "advertised",
            Self::Readvertised => "readvertised",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Receives registration lifecycle notifications.
///
/// Called from the background task, so implementations must not block.
pub trait Handler: Send + Sync {
    /// A lifecycle event occurred.
    fn on(&self, event: Event);

    /// Consecutive failures reached the configured threshold.
    fn on_error(&self, err: &MeshError);
}

/// Handler that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl Handler for NullHandler {
    fn on(&self, _event: Event) {}

    fn on_error(&self, _err: &MeshError) {}
}
