//! Registration errors.

use crate::rpc::CallError;

use super::protocol::AdvertiseException;

/// Errors raised by the registration controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    /// A single advertise call failed.
    #[error("advertise failed: {0}")]
    Advertise(#[from] CallError<AdvertiseException>),

    /// Consecutive background failures reached the threshold.
    #[error("advertise failed {consecutive_failures} times in a row: {cause}")]
    AdvertiseFailed {
        /// The most recent failure.
        cause: CallError<AdvertiseException>,
        /// Failures since the last success.
        consecutive_failures: u32,
        /// Whether the background cycle keeps going.
        will_retry: bool,
    },

    /// The background cycle stopped for good; the process is no longer
    /// registered.
    #[error("registration lost after {consecutive_failures} consecutive failures: {cause}")]
    RegistrationLost {
        /// The most recent failure.
        cause: CallError<AdvertiseException>,
        /// Failures since the last success.
        consecutive_failures: u32,
    },

    /// This controller already runs a background cycle.
    #[error("already advertising {host_port}")]
    AlreadyAdvertising {
        /// The address being advertised.
        host_port: String,
    },

    /// The background task panicked or was aborted.
    #[error("advertise task aborted: {0}")]
    TaskAborted(String),
}

impl MeshError {
    /// Returns `true` for [`MeshError::RegistrationLost`].
    #[must_use]
    pub fn is_registration_lost(&self) -> bool {
        matches!(self, Self::RegistrationLost { .. })
    }
}
