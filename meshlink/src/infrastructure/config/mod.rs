//! Configuration management for meshlink.
//!
//! Settings are layered: built-in defaults first, then an optional TOML
//! document, then environment variables prefixed with `MESHLINK` using `__`
//! as the section separator. List values are comma separated.
//!
//! # Example
//!
//! ```
//! use meshlink::infrastructure::config::Settings;
//!
//! let settings = Settings::from_toml("[mesh]\nservices = [\"KeyValue\"]").unwrap();
//! assert_eq!(settings.mesh.services, vec!["KeyValue".to_string()]);
//! ```

pub mod mesh;
pub mod server;
pub mod telemetry;

pub use mesh::MeshSettings;
pub use server::ServerSettings;
pub use telemetry::TelemetrySettings;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Control-plane server settings.
    pub server: ServerSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
    /// Mesh registration settings.
    pub mesh: MeshSettings,
}

impl Settings {
    /// Creates settings from defaults and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Creates settings from defaults overlaid with a TOML document.
    ///
    /// Environment variables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or deserialize.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 9090)?
        .set_default("telemetry.service_name", "meshlink")?
        .set_default("telemetry.sampling_ratio", 1.0)?
        .set_default("telemetry.log_level", "info")?
        .set_default("mesh.host_port", "127.0.0.1:4040")?
        .set_default("mesh.initial_nodes", Vec::<String>::new())?
        .set_default("mesh.services", vec!["KeyValue", "Admin"])?
        .set_default("mesh.timeout_ms", 1_000)?
        .set_default("mesh.advertise_interval_ms", 50_000)?
        .set_default("mesh.max_failures", 3)?
        .set_default("mesh.fail_strategy", "fatal")
}

fn environment() -> Environment {
    Environment::with_prefix("MESHLINK")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("mesh.initial_nodes")
        .with_list_parse_key("mesh.services")
        .try_parsing(true)
}

/// Listening address of a local socket: an IP literal and a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddress(pub String, pub u16);

impl BindAddress {
    /// Converts the bind address to a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the IP address string cannot be parsed.
    pub fn to_socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        let ip = self
            .0
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid IP address '{}': {e}", self.0))?;
        Ok(std::net::SocketAddr::new(ip, self.1))
    }
}
