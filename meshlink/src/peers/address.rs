//! Routable peer addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for address and configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The address is empty or contains only whitespace.
    #[error("Peer address cannot be empty")]
    EmptyAddress,
    /// The address is not `host:port`.
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),
    /// No service names were configured for advertisement.
    #[error("At least one service must be advertised")]
    NoServices,
}

/// A `host:port` string a transport can dial.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Creates a new `PeerAddress`, validating it is non-empty and well-formed.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyAddress` if the address is empty.
    /// Returns `ValidationError::InvalidAddressFormat` if it is not `host:port`
    /// with a numeric port.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        let Some((host, port)) = trimmed.rsplit_once(':') else {
            return Err(ValidationError::InvalidAddressFormat(format!(
                "'{trimmed}' is missing a port"
            )));
        };
        if host.is_empty() {
            return Err(ValidationError::InvalidAddressFormat(format!(
                "'{trimmed}' is missing a host"
            )));
        }
        if port.parse::<u16>().is_err() {
            return Err(ValidationError::InvalidAddressFormat(format!(
                "'{port}' is not a valid port"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the string representation of this `PeerAddress`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PeerAddress` and returns the inner String.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PeerAddress> for String {
    fn from(address: PeerAddress) -> Self {
        address.0
    }
}
