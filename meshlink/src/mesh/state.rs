//! Observable registration state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Where the registration currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Nothing has been advertised yet.
    #[default]
    Unregistered,
    /// The last advertisement succeeded.
    Registered,
    /// Recent advertisements failed; the cycle is still running.
    Degraded,
    /// The cycle gave up after repeated failures.
    Lost,
    /// The cycle was stopped on request.
    Stopped,
}

impl RegistrationStatus {
    /// Returns `true` while the mesh can still route to this process.
    #[must_use]
    pub fn is_routable(self) -> bool {
        matches!(self, Self::Registered | Self::Degraded)
    }
}

/// Snapshot of the registration state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationState {
    /// Current status.
    pub status: RegistrationStatus,
    /// Failures since the last success, reset when the threshold fires
    /// under the ignore strategy.
    pub consecutive_failures: u32,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// When the last advertisement succeeded.
    pub last_success: Option<DateTime<Utc>>,
}

/// Shared, read-mostly view of a [`RegistrationState`].
///
/// Only the controller writes; everything else reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct RegistrationMonitor {
    inner: Arc<RwLock<RegistrationState>>,
}

impl RegistrationMonitor {
    /// Creates a monitor in the `Unregistered` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> RegistrationState {
        self.inner.read().clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> RegistrationStatus {
        self.inner.read().status
    }

    pub(crate) fn record_success(&self) {
        let mut state = self.inner.write();
        state.status = RegistrationStatus::Registered;
        state.consecutive_failures = 0;
        state.last_error = None;
        state.last_success = Some(Utc::now());
    }

    /// Records a failure and returns the new consecutive count.
    pub(crate) fn record_failure(&self, message: String) -> u32 {
        let mut state = self.inner.write();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_error = Some(message);
        if state.status != RegistrationStatus::Unregistered {
            state.status = RegistrationStatus::Degraded;
        }
        state.consecutive_failures
    }

    pub(crate) fn reset_failures(&self) {
        self.inner.write().consecutive_failures = 0;
    }

    pub(crate) fn set_status(&self, status: RegistrationStatus) {
        self.inner.write().status = status;
    }
}
