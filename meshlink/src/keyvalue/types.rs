//! Method contracts of the `KeyValue` and `Admin` services.

use serde::{Deserialize, Serialize};

use crate::rpc::{Method, NoException};

/// Name of the key-value service.
pub const KEY_VALUE_SERVICE: &str = "KeyValue";
/// Name of the admin service.
pub const ADMIN_SERVICE: &str = "Admin";

/// The requested key has no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("key not found: {key}")]
pub struct KeyNotFound {
    /// Requested key.
    pub key: String,
}

/// The key cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("invalid key '{key}'")]
pub struct InvalidKey {
    /// Rejected key.
    pub key: String,
}

/// The caller may not run an admin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("user '{user}' is not authorized")]
pub struct NotAuthorized {
    /// Value of the caller's `user` header.
    pub user: String,
}

crate::exception_set! {
    /// Exceptions declared by [`Get`].
    pub enum GetException {
        NotFound(KeyNotFound) = "notFound",
    }
}

crate::exception_set! {
    /// Exceptions declared by [`Set`].
    pub enum SetException {
        InvalidKey(InvalidKey) = "invalidKey",
    }
}

crate::exception_set! {
    /// Exceptions declared by [`ClearAll`].
    pub enum ClearAllException {
        NotAuthorized(NotAuthorized) = "notAuthorized",
    }
}

/// Arguments of [`Get`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArgs {
    /// Key to read.
    pub key: String,
}

/// Arguments of [`Set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetArgs {
    /// Key to write.
    pub key: String,
    /// Value to store.
    pub value: String,
}

/// `Get(key) -> value`.
pub struct Get;

impl Method for Get {
    const NAME: &'static str = "Get";
    type Args = GetArgs;
    type Success = String;
    type Exception = GetException;
}

/// `Set(key, value)`; no return value.
pub struct Set;

impl Method for Set {
    const NAME: &'static str = "Set";
    type Args = SetArgs;
    type Success = ();
    type Exception = SetException;
}

/// `HealthCheck() -> status`. Exposed by both services.
pub struct HealthCheck;

impl Method for HealthCheck {
    const NAME: &'static str = "HealthCheck";
    type Args = ();
    type Success = String;
    type Exception = NoException;
}

/// `clearAll()`; no return value.
pub struct ClearAll;

impl Method for ClearAll {
    const NAME: &'static str = "clearAll";
    type Args = ();
    type Success = ();
    type Exception = ClearAllException;
}
