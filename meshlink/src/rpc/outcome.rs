//! The exception union: a call's application-level outcome.
//!
//! A call that reached its handler ends in exactly one of two ways: the
//! handler produced a success value, or it raised one of the method's
//! declared exceptions. Anything else is a transport failure and never shows
//! up here. [`Outcome`] is the typed form used by clients and handlers;
//! [`WireOutcome`] is the untyped form that crosses the transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::TransportError;
use super::method::Exception;

/// Typed outcome of a call that reached its handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<S, E> {
    /// The handler returned a value.
    Success(S),
    /// The handler raised a declared exception.
    Exception(E),
}

impl<S, E> Outcome<S, E> {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success value, if any.
    pub fn success(&self) -> Option<&S> {
        match self {
            Self::Success(value) => Some(value),
            Self::Exception(_) => None,
        }
    }

    /// Returns the exception, if any.
    pub fn exception(&self) -> Option<&E> {
        match self {
            Self::Success(_) => None,
            Self::Exception(err) => Some(err),
        }
    }

    /// Converts into a `Result`, with the exception as the error.
    ///
    /// # Errors
    ///
    /// Returns the exception for [`Outcome::Exception`].
    pub fn into_result(self) -> Result<S, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Exception(err) => Err(err),
        }
    }
}

impl<S, E> From<Result<S, E>> for Outcome<S, E> {
    fn from(result: Result<S, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Exception(err),
        }
    }
}

/// Untyped outcome as carried in a reply body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireOutcome {
    /// Encoded success value.
    Success(serde_json::Value),
    /// A declared exception and its encoded body.
    Exception {
        /// Wire name of the exception.
        name: String,
        /// Encoded exception body.
        payload: serde_json::Value,
    },
}

impl WireOutcome {
    /// Encodes a typed outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the value or exception cannot be encoded.
    pub fn encode<S: Serialize, E: Exception>(
        outcome: &Outcome<S, E>,
    ) -> Result<Self, serde_json::Error> {
        match outcome {
            Outcome::Success(value) => serde_json::to_value(value).map(Self::Success),
            Outcome::Exception(err) => Ok(Self::Exception {
                name: err.name().to_string(),
                payload: err.to_payload()?,
            }),
        }
    }

    /// Decodes into a typed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MalformedReply`] if the success value does
    /// not match `S`, or if the exception is not one `E` declares.
    pub fn decode<S: DeserializeOwned, E: Exception>(self) -> Result<Outcome<S, E>, TransportError> {
        match self {
            Self::Success(value) => serde_json::from_value(value)
                .map(Outcome::Success)
                .map_err(|e| TransportError::MalformedReply(format!("success value: {e}"))),
            Self::Exception { name, payload } => match E::from_payload(&name, payload) {
                Ok(Some(err)) => Ok(Outcome::Exception(err)),
                Ok(None) => Err(TransportError::MalformedReply(format!(
                    "undeclared exception '{name}'"
                ))),
                Err(e) => Err(TransportError::MalformedReply(format!(
                    "exception '{name}': {e}"
                ))),
            },
        }
    }

    /// Returns `true` for [`WireOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
