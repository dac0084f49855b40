//! Error types for calls and dispatch.

use std::fmt;

use super::method::Exception;

/// Kind of failure reported by a remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The server does not host the service.
    UnknownService,
    /// The service does not expose the method.
    UnknownMethod,
    /// The arguments could not be decoded.
    MalformedArguments,
    /// The handler failed with an undeclared error.
    Handler,
    /// The server could not encode its reply.
    Encode,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::UnknownService => "unknown service",
            Self::UnknownMethod => "unknown method",
            Self::MalformedArguments => "malformed arguments",
            Self::Handler => "handler error",
            Self::Encode => "encode error",
        };
        f.write_str(kind)
    }
}

/// Failure of a call at the transport level.
///
/// Declared exceptions are never represented here; see
/// [`CallError::Exception`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer directory has no address for the service.
    #[error("no peers available for service '{service}'")]
    NoPeers {
        /// Service that was called.
        service: String,
    },
    /// Nothing is listening at the peer address.
    #[error("connection to {peer} refused")]
    ConnectionRefused {
        /// Address that was dialed.
        peer: String,
    },
    /// The call did not complete before the context deadline.
    #[error("call to {service}::{method} timed out")]
    Timeout {
        /// Service that was called.
        service: String,
        /// Method that was called.
        method: String,
    },
    /// The server rejected or failed the call.
    #[error("remote {kind}: {message}")]
    Remote {
        /// What went wrong on the server.
        kind: RemoteErrorKind,
        /// Server-side description.
        message: String,
    },
    /// The reply could not be decoded.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    /// The arguments could not be encoded.
    #[error("failed to encode arguments: {0}")]
    Encode(String),
    /// Any other network-level failure.
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Returns `true` if a later attempt of the same call may succeed.
    ///
    /// The client never retries by itself; this only informs callers that
    /// implement their own policy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NoPeers { .. }
            | Self::ConnectionRefused { .. }
            | Self::Timeout { .. }
            | Self::Network(_) => true,
            Self::Remote { kind, .. } => *kind == RemoteErrorKind::Handler,
            Self::MalformedReply(_) | Self::Encode(_) => false,
        }
    }

    /// Returns `true` if the deadline expired.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Server-side dispatch failure.
///
/// None of these can be carried in the exception union, so they all reach
/// the client as [`TransportError::Remote`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No service with that name is hosted.
    #[error("service '{service}' not found")]
    UnknownService {
        /// Requested service.
        service: String,
    },
    /// The service has no handler for the method.
    #[error("method '{method}' not found in service '{service}'")]
    UnknownMethod {
        /// Service that was addressed.
        service: String,
        /// Requested method.
        method: String,
    },
    /// Argument bytes did not decode into the method's argument struct.
    #[error("malformed arguments for {service}::{method}: {reason}")]
    MalformedArguments {
        /// Service that was addressed.
        service: String,
        /// Method that was addressed.
        method: String,
        /// Decoder message.
        reason: String,
    },
    /// The handler returned an error outside its declared exceptions.
    #[error("handler for {service}::{method} failed: {message}")]
    Handler {
        /// Service that was addressed.
        service: String,
        /// Method that was addressed.
        method: String,
        /// Handler error, rendered with its causes.
        message: String,
    },
    /// The reply could not be encoded.
    #[error("failed to encode reply for {service}::{method}: {reason}")]
    Encode {
        /// Service that was addressed.
        service: String,
        /// Method that was addressed.
        method: String,
        /// Encoder message.
        reason: String,
    },
    /// A method was registered twice on the same service.
    #[error("method '{method}' registered twice in service '{service}'")]
    DuplicateMethod {
        /// Service being built.
        service: String,
        /// Method registered twice.
        method: String,
    },
}

impl DispatchError {
    /// Remote kind reported to the client.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::UnknownService { .. } => RemoteErrorKind::UnknownService,
            Self::UnknownMethod { .. } | Self::DuplicateMethod { .. } => {
                RemoteErrorKind::UnknownMethod
            }
            Self::MalformedArguments { .. } => RemoteErrorKind::MalformedArguments,
            Self::Handler { .. } => RemoteErrorKind::Handler,
            Self::Encode { .. } => RemoteErrorKind::Encode,
        }
    }
}

impl From<DispatchError> for TransportError {
    fn from(err: DispatchError) -> Self {
        Self::Remote {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Error returned by a typed call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CallError<E: Exception> {
    /// The handler raised one of the method's declared exceptions.
    #[error(transparent)]
    Exception(E),
    /// The call failed before an outcome was produced.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl<E: Exception> CallError<E> {
    /// Returns the declared exception, if that is what the call produced.
    pub fn exception(&self) -> Option<&E> {
        match self {
            Self::Exception(err) => Some(err),
            Self::Transport(_) => None,
        }
    }

    /// Returns the transport failure, if that is what the call produced.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Exception(_) => None,
            Self::Transport(err) => Some(err),
        }
    }
}

/// Error returned by a server handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError<E> {
    /// A declared exception; travels to the client inside the outcome.
    #[error(transparent)]
    Exception(E),
    /// Anything else; fails the call at the transport level.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl<E> HandlerError<E> {
    /// Wraps a declared exception.
    pub fn exception(err: impl Into<E>) -> Self {
        Self::Exception(err.into())
    }

    /// Builds an internal error from a message.
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{message}"))
    }
}
