//! Server-side dispatch: service descriptors and handler tables.
//!
//! A [`ServiceDispatcher`] is built once from a name and a set of typed
//! handlers, then shared freely. Each handler is type-erased into a function
//! from raw arguments to an encoded [`Reply`], so dispatch is a single map
//! lookup followed by the call.

use futures_util::future::BoxFuture;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::context::Context;
use super::error::{DispatchError, HandlerError};
use super::method::{Exception, Method};
use super::outcome::{Outcome, WireOutcome};
use super::payload::Payload;
use super::transport::Reply;

type ErasedHandler =
    Arc<dyn Fn(Context, Payload) -> BoxFuture<'static, Result<Reply, DispatchError>> + Send + Sync>;

/// Name and method list of a service. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    name: String,
    methods: Vec<&'static str>,
}

impl ServiceDescriptor {
    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method names in registration order.
    #[must_use]
    pub fn method_names(&self) -> &[&'static str] {
        &self.methods
    }

    /// Returns `true` if the service exposes `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }
}

/// Builder collecting the handlers of one service.
pub struct ServiceBuilder {
    name: String,
    methods: Vec<&'static str>,
    handlers: HashMap<&'static str, ErasedHandler>,
    duplicate: Option<&'static str>,
}

impl ServiceBuilder {
    /// Starts a service called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            handlers: HashMap::new(),
            duplicate: None,
        }
    }

    /// Registers the handler for method `M`.
    ///
    /// A handler returning [`HandlerError::Exception`] produces an
    /// application-level failure carried in the reply; one returning
    /// [`HandlerError::Internal`] fails the call at the transport level.
    #[must_use]
    pub fn method<M, F, Fut>(mut self, handler: F) -> Self
    where
        M: Method,
        F: Fn(Context, M::Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Success, HandlerError<M::Exception>>> + Send + 'static,
    {
        if self.handlers.contains_key(M::NAME) {
            self.duplicate.get_or_insert(M::NAME);
            return self;
        }

        let service: Arc<str> = Arc::from(self.name.as_str());
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: Context, raw: Payload| {
            let handler = Arc::clone(&handler);
            let service = Arc::clone(&service);
            Box::pin(async move {
                let args: M::Args =
                    raw.decode()
                        .map_err(|e| DispatchError::MalformedArguments {
                            service: service.to_string(),
                            method: M::NAME.to_string(),
                            reason: e.to_string(),
                        })?;

                let outcome = match (*handler)(ctx, args).await {
                    Ok(value) => Outcome::Success(value),
                    Err(HandlerError::Exception(err)) => Outcome::Exception(err),
                    Err(HandlerError::Internal(err)) => {
                        return Err(DispatchError::Handler {
                            service: service.to_string(),
                            method: M::NAME.to_string(),
                            message: format!("{err:#}"),
                        });
                    }
                };

                encode_reply(&service, M::NAME, &outcome)
            }) as BoxFuture<'static, Result<Reply, DispatchError>>
        });

        self.methods.push(M::NAME);
        self.handlers.insert(M::NAME, erased);
        self
    }

    /// Finishes the service.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateMethod`] if a method was registered
    /// more than once.
    pub fn build(self) -> Result<ServiceDispatcher, DispatchError> {
        if let Some(method) = self.duplicate {
            return Err(DispatchError::DuplicateMethod {
                service: self.name,
                method: method.to_string(),
            });
        }
        Ok(ServiceDispatcher {
            inner: Arc::new(DispatcherInner {
                descriptor: ServiceDescriptor {
                    name: self.name,
                    methods: self.methods,
                },
                handlers: self.handlers,
            }),
        })
    }
}

fn encode_reply<S: Serialize, E: Exception>(
    service: &str,
    method: &str,
    outcome: &Outcome<S, E>,
) -> Result<Reply, DispatchError> {
    let encode_error = |e: serde_json::Error| DispatchError::Encode {
        service: service.to_string(),
        method: method.to_string(),
        reason: e.to_string(),
    };
    let wire = WireOutcome::encode(outcome).map_err(encode_error)?;
    let ok = wire.is_success();
    let body = Payload::encode(&wire).map_err(encode_error)?;
    Ok(Reply { ok, body })
}

struct DispatcherInner {
    descriptor: ServiceDescriptor,
    handlers: HashMap<&'static str, ErasedHandler>,
}

/// A built service: descriptor plus read-only handler table.
///
/// Cloning is cheap and dispatch needs no locking, so any number of calls
/// may run concurrently.
#[derive(Clone)]
pub struct ServiceDispatcher {
    inner: Arc<DispatcherInner>,
}

impl ServiceDispatcher {
    /// Starts building a service called `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(name)
    }

    /// Service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.inner.descriptor.name()
    }

    /// Method names in registration order.
    #[must_use]
    pub fn method_names(&self) -> &[&'static str] {
        self.inner.descriptor.method_names()
    }

    /// The service descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.inner.descriptor
    }

    /// Runs the handler for `method` against raw arguments.
    ///
    /// On `Ok`, `reply.ok` tells whether the handler succeeded or raised a
    /// declared exception.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] for unregistered methods,
    /// [`DispatchError::MalformedArguments`] when the arguments do not
    /// decode, and [`DispatchError::Handler`] when the handler fails with an
    /// undeclared error.
    pub async fn dispatch(
        &self,
        method: &str,
        ctx: Context,
        raw: Payload,
    ) -> Result<Reply, DispatchError> {
        let service = self.service_name();
        let Some(handler) = self.inner.handlers.get(method) else {
            warn!(service, method, "Call to unknown method");
            metrics::counter!(
                "meshlink_server_dispatch_total",
                "service" => service.to_string(),
                "result" => "unknown_method"
            )
            .increment(1);
            return Err(DispatchError::UnknownMethod {
                service: service.to_string(),
                method: method.to_string(),
            });
        };

        let call_id = ctx.call_id();
        let result = handler(ctx, raw).await;
        let label = match &result {
            Ok(reply) if reply.ok => "ok",
            Ok(_) => "exception",
            Err(err) => {
                warn!(service, method, %call_id, error = %err, "Dispatch failed");
                "error"
            }
        };
        debug!(service, method, %call_id, result = label, "Dispatched call");
        metrics::counter!(
            "meshlink_server_dispatch_total",
            "service" => service.to_string(),
            "result" => label
        )
        .increment(1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::NoException;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
    #[error("negative input {value}")]
    struct Negative {
        value: i64,
    }

    crate::exception_set! {
        enum SqrtException {
            Negative(Negative) = "negative",
        }
    }

    #[derive(Serialize, Deserialize)]
    struct SqrtArgs {
        value: i64,
    }

    struct Sqrt;

    impl Method for Sqrt {
        const NAME: &'static str = "sqrt";
        type Args = SqrtArgs;
        type Success = i64;
        type Exception = SqrtException;
    }

    struct Crash;

    impl Method for Crash {
        const NAME: &'static str = "crash";
        type Args = ();
        type Success = ();
        type Exception = NoException;
    }

    fn calculator() -> ServiceDispatcher {
        ServiceBuilder::new("Calculator")
            .method::<Sqrt, _, _>(|_ctx, args: SqrtArgs| async move {
                if args.value < 0 {
                    return Err(HandlerError::exception(Negative { value: args.value }));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                let root = (args.value as f64).sqrt() as i64;
                Ok(root)
            })
            .method::<Crash, _, _>(|_ctx, ()| async move {
                Err(HandlerError::Internal(anyhow::anyhow!("boom")))
            })
            .build()
            .unwrap()
    }

    fn ctx() -> Context {
        Context::with_timeout(Duration::from_secs(1))
    }

    #[test]
    fn descriptor_should_list_methods_in_registration_order() {
        let service = calculator();
        assert_eq!(service.service_name(), "Calculator");
        assert_eq!(service.method_names(), &["sqrt", "crash"]);
        assert!(service.descriptor().contains("sqrt"));
        assert!(!service.descriptor().contains("cbrt"));
    }

    #[tokio::test]
    async fn success_should_set_only_the_success_field() {
        let reply = calculator()
            .dispatch("sqrt", ctx(), Payload::encode(&SqrtArgs { value: 16 }).unwrap())
            .await
            .unwrap();

        assert!(reply.ok);
        let wire: WireOutcome = reply.body.decode().unwrap();
        assert_eq!(wire, WireOutcome::Success(serde_json::json!(4)));
    }

    #[tokio::test]
    async fn declared_exception_should_be_transport_successful() {
        let reply = calculator()
            .dispatch("sqrt", ctx(), Payload::encode(&SqrtArgs { value: -1 }).unwrap())
            .await
            .unwrap();

        assert!(!reply.ok);
        let outcome = reply
            .body
            .decode::<WireOutcome>()
            .unwrap()
            .decode::<i64, SqrtException>()
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Exception(SqrtException::Negative(Negative { value: -1 }))
        );
    }

    #[tokio::test]
    async fn undeclared_handler_error_should_fail_dispatch() {
        let err = calculator()
            .dispatch("crash", ctx(), Payload::encode(&()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler { ref message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn unknown_method_should_fail_regardless_of_payload() {
        let service = calculator();
        for payload in [
            Payload::default(),
            Payload::encode(&SqrtArgs { value: 4 }).unwrap(),
            Payload::from_bytes(&b"not json"[..]),
        ] {
            let err = service.dispatch("cbrt", ctx(), payload).await.unwrap_err();
            assert_eq!(
                err,
                DispatchError::UnknownMethod {
                    service: "Calculator".to_string(),
                    method: "cbrt".to_string(),
                }
            );
        }
    }

    #[tokio::test]
    async fn undecodable_arguments_should_be_malformed() {
        let err = calculator()
            .dispatch("sqrt", ctx(), Payload::from_bytes(&b"{\"value\":\"x\"}"[..]))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MalformedArguments { .. }));
    }

    #[test]
    fn registering_a_method_twice_should_fail_to_build() {
        let result = ServiceBuilder::new("Calculator")
            .method::<Crash, _, _>(|_ctx, ()| async move { Ok(()) })
            .method::<Crash, _, _>(|_ctx, ()| async move { Ok(()) })
            .build();
        assert!(matches!(
            result,
            Err(DispatchError::DuplicateMethod { ref method, .. }) if method == "crash"
        ));
    }
}
