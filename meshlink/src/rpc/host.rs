//! A process hosting several services behind one address.

use std::collections::HashMap;
use tracing::{info, warn};

use super::context::Context;
use super::error::DispatchError;
use super::payload::Payload;
use super::server::ServiceDispatcher;
use super::transport::Reply;

/// Routes incoming calls to the hosted services by name.
///
/// Services are registered explicitly while the server is being assembled;
/// once wrapped in an `Arc` and handed to a transport it is read-only.
#[derive(Clone, Default)]
pub struct Server {
    services: HashMap<String, ServiceDispatcher>,
}

impl Server {
    /// Creates a server hosting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hosts `service`, replacing any service with the same name.
    ///
    /// Returns the replaced service, if any.
    pub fn register(&mut self, service: ServiceDispatcher) -> Option<ServiceDispatcher> {
        let name = service.service_name().to_string();
        info!(service = %name, methods = ?service.method_names(), "Registering service");
        let replaced = self.services.insert(name.clone(), service);
        if replaced.is_some() {
            warn!(service = %name, "Replaced previously registered service");
        }
        replaced
    }

    /// Builder-style [`Server::register`].
    #[must_use]
    pub fn with_service(mut self, service: ServiceDispatcher) -> Self {
        self.register(service);
        self
    }

    /// Names of the hosted services, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Looks up a hosted service.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDispatcher> {
        self.services.get(name)
    }

    /// Dispatches a call to the named service.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownService`] if no such service is hosted,
    /// otherwise whatever [`ServiceDispatcher::dispatch`] returns.
    pub async fn handle(
        &self,
        service: &str,
        method: &str,
        ctx: Context,
        raw: Payload,
    ) -> Result<Reply, DispatchError> {
        let Some(dispatcher) = self.services.get(service) else {
            warn!(service, method, "Call to unknown service");
            return Err(DispatchError::UnknownService {
                service: service.to_string(),
            });
        };
        dispatcher.dispatch(method, ctx, raw).await
    }
}
