/// Audit logging for registration and lifecycle events.
pub mod audit;
/// Layered configuration.
pub mod config;
/// Control-plane HTTP server.
pub mod server;
/// Logging and trace export setup.
pub mod telemetry;
