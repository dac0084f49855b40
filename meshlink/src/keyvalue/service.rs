//! Service traits and their server adapters.

use async_trait::async_trait;
use std::sync::Arc;

use super::types::{
    ClearAll, ClearAllException, Get, GetArgs, GetException, HealthCheck, Set, SetArgs,
    SetException, ADMIN_SERVICE, KEY_VALUE_SERVICE,
};
use crate::rpc::{
    Context, DispatchError, HandlerError, NoException, ServiceBuilder, ServiceDispatcher,
};

/// Server-side behavior of the `KeyValue` service.
#[async_trait]
pub trait KeyValue: Send + Sync + 'static {
    /// Reads `key`.
    async fn get(&self, ctx: &Context, key: &str) -> Result<String, HandlerError<GetException>>;

    /// Writes `value` under `key`.
    async fn set(
        &self,
        ctx: &Context,
        key: &str,
        value: &str,
    ) -> Result<(), HandlerError<SetException>>;

    /// Reports liveness.
    async fn health_check(&self, ctx: &Context) -> Result<String, HandlerError<NoException>>;
}

/// Server-side behavior of the `Admin` service.
#[async_trait]
pub trait Admin: Send + Sync + 'static {
    /// Reports liveness.
    async fn health_check(&self, ctx: &Context) -> Result<String, HandlerError<NoException>>;

    /// Removes every stored value.
    async fn clear_all(&self, ctx: &Context) -> Result<(), HandlerError<ClearAllException>>;
}

/// Builds the `KeyValue` service around `handler`.
///
/// # Errors
///
/// Only fails if the service definition itself is invalid.
pub fn key_value_service<H: KeyValue>(handler: Arc<H>) -> Result<ServiceDispatcher, DispatchError> {
    let get = Arc::clone(&handler);
    let set = Arc::clone(&handler);
    let health = handler;

    ServiceBuilder::new(KEY_VALUE_SERVICE)
        .method::<Get, _, _>(move |ctx, args: GetArgs| {
            let handler = Arc::clone(&get);
            async move { handler.get(&ctx, &args.key).await }
        })
        .method::<HealthCheck, _, _>(move |ctx, ()| {
            let handler = Arc::clone(&health);
            async move { KeyValue::health_check(handler.as_ref(), &ctx).await }
        })
        .method::<Set, _, _>(move |ctx, args: SetArgs| {
            let handler = Arc::clone(&set);
            async move { handler.set(&ctx, &args.key, &args.value).await }
        })
        .build()
}

/// Builds the `Admin` service around `handler`.
///
/// # Errors
///
/// Only fails if the service definition itself is invalid.
pub fn admin_service<H: Admin>(handler: Arc<H>) -> Result<ServiceDispatcher, DispatchError> {
    let health = Arc::clone(&handler);
    let clear = handler;

    ServiceBuilder::new(ADMIN_SERVICE)
        .method::<HealthCheck, _, _>(move |ctx, ()| {
            let handler = Arc::clone(&health);
            async move { Admin::health_check(handler.as_ref(), &ctx).await }
        })
        .method::<ClearAll, _, _>(move |ctx, ()| {
            let handler = Arc::clone(&clear);
            async move { handler.clear_all(&ctx).await }
        })
        .build()
}
