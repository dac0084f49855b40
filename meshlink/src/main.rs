//! Demo mesh node.
//!
//! Serves a registrar and a key-value node on the loopback network,
//! advertises the key-value node and exposes the control plane until
//! Ctrl-C or SIGTERM. Exits with status 1 if the registration is lost.

use anyhow::Context as _;
use meshlink::infrastructure::{audit, config::Settings, server, telemetry::TelemetryBuilder};
use meshlink::keyvalue::{
    admin_service, key_value_service, KeyValueClient, MemoryStore, KEY_VALUE_SERVICE,
};
use meshlink::mesh::{Event, Handler, MeshClient, MeshError, Registrar, REGISTRATION_SERVICE};
use meshlink::peers::{PeerAddress, PeerDirectory};
use meshlink::rpc::{Client, Context, LoopbackNetwork, Server};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// Registrar address used when no initial nodes are configured.
const LOCAL_REGISTRAR: &str = "127.0.0.1:21300";

struct LoggingHandler;

impl Handler for LoggingHandler {
    fn on(&self, event: Event) {
        info!(%event, "Registration event");
    }

    fn on_error(&self, err: &MeshError) {
        warn!(error = %err, "Registration failing");
    }
}

enum Exit {
    Signal,
    Cycle(Result<(), MeshError>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("Failed to load configuration")?;
    TelemetryBuilder::from_settings(&settings.telemetry, env!("CARGO_PKG_VERSION")).init()?;

    info!("Meshlink starting");
    audit::log_audit(&audit::AuditEvent::SystemStartup {
        component: "meshlink".into(),
    });

    let mut mesh_config = settings
        .mesh
        .to_config()
        .context("Invalid mesh settings")?;
    if mesh_config.initial_nodes.is_empty() {
        mesh_config.initial_nodes.push(PeerAddress::new(LOCAL_REGISTRAR)?);
    }

    // Every configured registrar is served in-process from one routing table.
    let network = LoopbackNetwork::new();
    let registrar = Registrar::new(PeerDirectory::new());
    let registry_node = Arc::new(Server::new().with_service(registrar.service()?));
    for node in &mesh_config.initial_nodes {
        network.listen(node.clone(), Arc::clone(&registry_node));
    }

    let store = Arc::new(MemoryStore::new());
    let kv_node = Server::new()
        .with_service(key_value_service(Arc::clone(&store))?)
        .with_service(admin_service(store)?);
    network.listen(mesh_config.host_port.clone(), Arc::new(kv_node));

    let transport = Arc::new(network);
    let client = Client::new(transport.clone(), PeerDirectory::new(), REGISTRATION_SERVICE);
    let options = settings
        .mesh
        .to_options()
        .with_handler(Arc::new(LoggingHandler));
    let mesh = MeshClient::new(&client, mesh_config.clone(), options);

    let handle = match mesh.advertise().await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to register with the mesh");
            std::process::exit(1);
        }
    };
    audit::log_audit(&audit::AuditEvent::Registered {
        host_port: mesh_config.host_port.to_string(),
        services: mesh_config.services.clone(),
    });

    // Route one call through the registrar's table to prove the advertisement landed.
    let routed = Client::new(transport, registrar.directory().clone(), KEY_VALUE_SERVICE);
    let kv = KeyValueClient::new(&routed);
    let ctx = Context::with_timeout(Duration::from_secs(1));
    kv.set(&ctx, "greeting", "hello").await?;
    let value = kv.get(&ctx, "greeting").await?;
    info!(value = %value, "Routed call succeeded");

    let (stop_server, server_stopped) = tokio::sync::oneshot::channel::<()>();
    let server_settings = settings.server.clone();
    let monitor = mesh.monitor();
    let control_plane = tokio::spawn(async move {
        let shutdown = async move {
            let _ = server_stopped.await;
        };
        if let Err(e) = server::run_server(&server_settings, monitor, shutdown).await {
            error!("Control Plane failed: {:?}", e);
        }
    });

    info!("Meshlink initialized. Waiting for shutdown signal...");

    let stop = handle.stop_signal();
    let join = handle.join();
    tokio::pin!(join);
    let exit = tokio::select! {
        () = shutdown_signal() => Exit::Signal,
        result = &mut join => Exit::Cycle(result),
    };
    let result = match exit {
        Exit::Signal => {
            info!("Shutdown signal received, cleaning up...");
            stop.stop();
            join.await
        }
        Exit::Cycle(result) => result,
    };

    let _ = stop_server.send(());
    if let Err(e) = control_plane.await {
        warn!(error = %e, "Control plane task ended abnormally");
    }

    if let Err(e) = result {
        error!(error = %e, "Mesh registration ended");
        audit::log_audit(&audit::AuditEvent::RegistrationLost {
            host_port: mesh_config.host_port.to_string(),
            error: e.to_string(),
        });
        std::process::exit(1);
    }

    audit::log_audit(&audit::AuditEvent::SystemShutdown {
        reason: "Signal received".into(),
    });
    info!("Meshlink shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
