//! Registration controller: initial advertisement plus the background
//! re-advertisement cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::MeshConfig;
use super::error::MeshError;
use super::handler::{Event, Handler, NullHandler};
use super::protocol::{
    Advertise, AdvertiseException, AdvertiseRequest, AdvertiseResponse, ServiceAd,
    REGISTRATION_SERVICE,
};
use super::state::{RegistrationMonitor, RegistrationState, RegistrationStatus};
use crate::rpc::{CallError, Client, Context};

/// Default deadline of one advertise call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// Default number of consecutive failures before escalating.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// What the background cycle does once failures reach the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailStrategy {
    /// Report the failure, stop the cycle and surface
    /// [`MeshError::RegistrationLost`] from [`AdvertiseHandle::join`].
    #[default]
    Fatal,
    /// Report the failure and keep trying.
    Ignore,
}

/// Options of a [`MeshClient`].
#[derive(Clone)]
pub struct ClientOptions {
    timeout: Duration,
    handler: Arc<dyn Handler>,
    fail_strategy: FailStrategy,
    max_failures: u32,
    advertise_interval: Option<Duration>,
}

impl ClientOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            handler: Arc::new(NullHandler),
            fail_strategy: FailStrategy::default(),
            max_failures: DEFAULT_MAX_FAILURES,
            advertise_interval: None,
        }
    }

    /// Sets the per-call deadline. Zero restores the default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the lifecycle handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = handler;
        self
    }

    /// Sets the failure strategy.
    #[must_use]
    pub fn with_fail_strategy(mut self, strategy: FailStrategy) -> Self {
        self.fail_strategy = strategy;
        self
    }

    /// Sets the consecutive-failure threshold. Zero is treated as one.
    #[must_use]
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Overrides [`MeshConfig::advertise_interval`].
    #[must_use]
    pub fn with_advertise_interval(mut self, interval: Duration) -> Self {
        self.advertise_interval = Some(interval);
        self
    }

    /// Effective per-call deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Failure strategy.
    #[must_use]
    pub fn fail_strategy(&self) -> FailStrategy {
        self.fail_strategy
    }

    /// Effective failure threshold.
    #[must_use]
    pub fn max_failures(&self) -> u32 {
        self.max_failures.max(1)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("timeout", &self.timeout)
            .field("fail_strategy", &self.fail_strategy)
            .field("max_failures", &self.max_failures)
            .field("advertise_interval", &self.advertise_interval)
            .finish_non_exhaustive()
    }
}

/// Keeps this process registered with the mesh.
///
/// At most one background cycle runs per controller.
pub struct MeshClient {
    cycle: Cycle,
    active: Arc<AtomicBool>,
}

impl MeshClient {
    /// Creates a controller advertising `config.services` at
    /// `config.host_port`.
    ///
    /// `config.initial_nodes` are added to the peers of the registration
    /// service in the directory shared by `client`.
    #[must_use]
    pub fn new(client: &Client, config: MeshConfig, options: ClientOptions) -> Self {
        let client = client.for_service(REGISTRATION_SERVICE);
        let peers = client.peers();
        for node in &config.initial_nodes {
            if peers.add(node.clone()) {
                debug!(node = %node, "Seeded registration peer");
            }
        }

        let request = AdvertiseRequest {
            host_port: config.host_port.to_string(),
            services: config.services.iter().map(ServiceAd::new).collect(),
        };

        Self {
            cycle: Cycle {
                client,
                request: Arc::new(request),
                timeout: options.timeout(),
                handler: Arc::clone(&options.handler),
                strategy: options.fail_strategy,
                max_failures: options.max_failures(),
                interval: options
                    .advertise_interval
                    .unwrap_or(config.advertise_interval),
                monitor: RegistrationMonitor::new(),
            },
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Advertises once and, on success, starts the background cycle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Advertise`] if the initial advertisement fails.
    /// No background task is started and the handler is not notified.
    ///
    /// Returns [`MeshError::AlreadyAdvertising`] while an earlier cycle of
    /// this controller is still running or its initial call is in flight.
    pub async fn advertise(&self) -> Result<AdvertiseHandle, MeshError> {
        let Some(guard) = ActiveGuard::acquire(&self.active) else {
            return Err(MeshError::AlreadyAdvertising {
                host_port: self.cycle.request.host_port.clone(),
            });
        };
        let cycle = self.cycle.clone();
        match cycle.advertise_once().await {
            Ok(response) => {
                cycle.monitor.record_success();
                info!(
                    host_port = %cycle.request.host_port,
                    accepted = response.accepted,
                    interval_ms = u64::try_from(cycle.interval.as_millis()).unwrap_or(u64::MAX),
                    "Advertised to mesh"
                );
                cycle.handler.on(Event::Advertised);
            }
            Err(err) => {
                cycle.monitor.record_failure(err.to_string());
                warn!(host_port = %cycle.request.host_port, error = %err, "Initial advertise failed");
                return Err(MeshError::Advertise(err));
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let monitor = cycle.monitor.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            cycle.run(stop_rx).await
        });
        Ok(AdvertiseHandle {
            stop: StopSignal(Arc::new(stop_tx)),
            task,
            monitor,
        })
    }

    /// Snapshot of the registration state.
    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.cycle.monitor.snapshot()
    }

    /// Shared view of the registration state.
    #[must_use]
    pub fn monitor(&self) -> RegistrationMonitor {
        self.cycle.monitor.clone()
    }

    /// Returns `true` while a background cycle is running.
    #[must_use]
    pub fn is_advertising(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Marks a controller busy; released when the cycle ends or the initial
/// call fails.
struct ActiveGuard(Arc<AtomicBool>);

impl ActiveGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
struct Cycle {
    client: Client,
    request: Arc<AdvertiseRequest>,
    timeout: Duration,
    handler: Arc<dyn Handler>,
    strategy: FailStrategy,
    max_failures: u32,
    interval: Duration,
    monitor: RegistrationMonitor,
}

impl Cycle {
    async fn advertise_once(&self) -> Result<AdvertiseResponse, CallError<AdvertiseException>> {
        let ctx = Context::with_timeout(self.timeout);
        let result = self.client.call::<Advertise>(&ctx, &self.request).await;
        metrics::counter!(
            "meshlink_advertise_total",
            "result" => if result.is_ok() { "ok" } else { "error" }
        )
        .increment(1);
        result
    }

    async fn run(self, mut stop: watch::Receiver<bool>) -> Result<(), MeshError> {
        loop {
            tokio::select! {
                biased;
                () = wait_for_stop(&mut stop) => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            let result = tokio::select! {
                biased;
                () = wait_for_stop(&mut stop) => break,
                result = self.advertise_once() => result,
            };

            let cause = match result {
                Ok(response) => {
                    self.monitor.record_success();
                    debug!(accepted = response.accepted, "Re-advertised to mesh");
                    self.handler.on(Event::Readvertised);
                    continue;
                }
                Err(cause) => cause,
            };

            let failures = self.monitor.record_failure(cause.to_string());
            warn!(
                error = %cause,
                consecutive_failures = failures,
                max_failures = self.max_failures,
                "Re-advertise failed"
            );
            if failures < self.max_failures {
                continue;
            }

            self.handler.on_error(&MeshError::AdvertiseFailed {
                cause: cause.clone(),
                consecutive_failures: failures,
                will_retry: self.strategy == FailStrategy::Ignore,
            });

            match self.strategy {
                FailStrategy::Ignore => self.monitor.reset_failures(),
                FailStrategy::Fatal => {
                    error!(
                        error = %cause,
                        consecutive_failures = failures,
                        "Giving up on mesh registration"
                    );
                    self.monitor.set_status(RegistrationStatus::Lost);
                    self.handler.on(Event::Terminated);
                    return Err(MeshError::RegistrationLost {
                        cause,
                        consecutive_failures: failures,
                    });
                }
            }
        }

        self.monitor.set_status(RegistrationStatus::Stopped);
        info!(host_port = %self.request.host_port, "Advertise cycle stopped");
        Ok(())
    }
}

/// Resolves once stop was requested. Never resolves if every sender is gone.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Requests the background cycle to stop. Cloneable.
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<watch::Sender<bool>>);

impl StopSignal {
    /// Requests the stop. Idempotent.
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Handle to a running background cycle.
///
/// Dropping the handle detaches the cycle; it keeps running until the
/// runtime shuts down or the fatal strategy ends it.
#[derive(Debug)]
pub struct AdvertiseHandle {
    stop: StopSignal,
    task: JoinHandle<Result<(), MeshError>>,
    monitor: RegistrationMonitor,
}

impl AdvertiseHandle {
    /// Requests the cycle to stop. An in-flight call is abandoned.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// A signal that stops this cycle, usable after the handle was consumed
    /// by [`AdvertiseHandle::join`].
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Waits for the cycle to end.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::RegistrationLost`] if the fatal strategy ended
    /// the cycle and [`MeshError::TaskAborted`] if the task panicked.
    pub async fn join(self) -> Result<(), MeshError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(MeshError::TaskAborted(err.to_string())),
        }
    }

    /// Stops the cycle and waits for it to end.
    ///
    /// # Errors
    ///
    /// See [`AdvertiseHandle::join`].
    pub async fn shutdown(self) -> Result<(), MeshError> {
        self.stop();
        self.join().await
    }

    /// Snapshot of the registration state.
    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.monitor.snapshot()
    }

    /// Returns `true` once the cycle has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_should_mean_default() {
        let options = ClientOptions::new().with_timeout(Duration::ZERO);
        assert_eq!(options.timeout(), DEFAULT_TIMEOUT);

        let options = options.with_timeout(Duration::from_millis(200));
        assert_eq!(options.timeout(), Duration::from_millis(200));
    }

    #[test]
    fn defaults_should_be_fatal_after_three_failures() {
        let options = ClientOptions::default();
        assert_eq!(options.fail_strategy(), FailStrategy::Fatal);
        assert_eq!(options.max_failures(), DEFAULT_MAX_FAILURES);
        assert_eq!(options.with_max_failures(0).max_failures(), 1);
    }

    #[test]
    fn fail_strategy_should_deserialize_from_lowercase() {
        let strategy: FailStrategy = serde_json::from_str("\"ignore\"").unwrap();
        assert_eq!(strategy, FailStrategy::Ignore);
    }

    #[test]
    fn guard_should_be_exclusive_until_dropped() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = ActiveGuard::acquire(&flag).unwrap();
        assert!(ActiveGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(ActiveGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn stop_before_any_change_should_be_observed() {
        let (tx, mut rx) = watch::channel(false);
        let signal = StopSignal(Arc::new(tx));
        signal.stop();
        tokio::time::timeout(Duration::from_secs(1), wait_for_stop(&mut rx))
            .await
            .unwrap();
    }
}
