//! Typed clients of the `KeyValue` and `Admin` services.

use super::types::{
    ClearAll, ClearAllException, Get, GetArgs, GetException, HealthCheck, Set, SetArgs,
    SetException, ADMIN_SERVICE, KEY_VALUE_SERVICE,
};
use crate::rpc::{CallError, Client, Context, NoException};

/// Client of the `KeyValue` service.
#[derive(Clone)]
pub struct KeyValueClient {
    client: Client,
}

impl KeyValueClient {
    /// Creates a client sharing `client`'s transport and peer directory.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.for_service(KEY_VALUE_SERVICE),
        }
    }

    /// Reads `key`.
    ///
    /// # Errors
    ///
    /// [`GetException::NotFound`] if the key has no value, or a transport
    /// failure.
    pub async fn get(&self, ctx: &Context, key: &str) -> Result<String, CallError<GetException>> {
        let args = GetArgs {
            key: key.to_string(),
        };
        self.client.call::<Get>(ctx, &args).await
    }

    /// Writes `value` under `key`.
    ///
    /// # Errors
    ///
    /// [`SetException::InvalidKey`] for unusable keys, or a transport
    /// failure.
    pub async fn set(
        &self,
        ctx: &Context,
        key: &str,
        value: &str,
    ) -> Result<(), CallError<SetException>> {
        let args = SetArgs {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.client.call::<Set>(ctx, &args).await
    }

    /// Asks the service for its health.
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn health_check(&self, ctx: &Context) -> Result<String, CallError<NoException>> {
        self.client.call::<HealthCheck>(ctx, &()).await
    }
}

/// Client of the `Admin` service.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
}

impl AdminClient {
    /// Creates a client sharing `client`'s transport and peer directory.
    #[must_use]
    pub fn new(client: &Client) -> Self {
        Self {
            client: client.for_service(ADMIN_SERVICE),
        }
    }

    /// Asks the service for its health.
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn health_check(&self, ctx: &Context) -> Result<String, CallError<NoException>> {
        self.client.call::<HealthCheck>(ctx, &()).await
    }

    /// Removes every stored value.
    ///
    /// # Errors
    ///
    /// [`ClearAllException::NotAuthorized`] unless the context carries
    /// `user: root`, or a transport failure.
    pub async fn clear_all(&self, ctx: &Context) -> Result<(), CallError<ClearAllException>> {
        self.client.call::<ClearAll>(ctx, &()).await
    }
}
