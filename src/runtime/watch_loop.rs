//! # Watch Loop
//!
//! Wires the Gateway controller into kube-runtime: Gateways are watched
//! directly, Nodes or Pods through the event mapper. kube-runtime serializes
//! reconciliations per Gateway and runs distinct Gateways concurrently.

use crate::config::ControllerConfig;
use crate::controller::mapper::map_to_request;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::controller::source::AddressSource;
use crate::crd::Gateway;
use crate::runtime::error_policy::{forget_missing, handle_reconciliation_error};
use futures::StreamExt;
use kube::api::Api;
use kube::Client;
use kube_runtime::controller::{self, Controller};
use kube_runtime::watcher;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Run the controller until a shutdown signal arrives.
pub async fn run_watch_loop<S: AddressSource + Clone>(
    client: Client,
    reconciler: Arc<Reconciler<S>>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) {
    let gateways: Api<Gateway> = Api::all(client.clone());
    let secondaries: Api<S::Object> = Api::all(client);
    let watcher_config = watcher::Config::default().timeout(config.watch_timeout_secs);

    server_state.set_ready(true);

    // Flip readiness and abort in-flight API calls as soon as a signal arrives;
    // the controller stream drains on its own via shutdown_on_signal.
    let cancel = reconciler.cancel.clone();
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.set_ready(false);
        cancel.cancel();
    });

    let source = reconciler.source.clone();
    let retry_state = Arc::clone(&reconciler);
    info!(
        address_source = S::NAME,
        concurrency = config.max_concurrent_reconciliations,
        "Starting Gateway controller"
    );

    Controller::new(gateways, watcher_config.clone())
        .with_config(controller::Config::default().concurrency(config.max_concurrent_reconciliations))
        .watches(secondaries, watcher_config, move |obj| {
            map_to_request(&source, &obj)
        })
        .shutdown_on_signal()
        .run(
            reconcile::<S>,
            handle_reconciliation_error::<S>,
            reconciler,
        )
        .for_each(move |result| {
            match result {
                Ok((obj, action)) => {
                    debug!(gateway = %obj, ?action, "Gateway reconciled");
                }
                // A requeued Gateway was deleted while failing.
                Err(controller::Error::ObjectNotFound(obj_ref)) => {
                    debug!(gateway = %obj_ref, "Gateway gone, dropping retry state");
                    forget_missing(&retry_state, obj_ref.namespace.as_deref(), &obj_ref.name);
                }
                Err(e) => {
                    warn!(error = %e, "Controller stream error");
                }
            }
            futures::future::ready(())
        })
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
}

/// Resolves on SIGINT or SIGTERM.
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
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {}
        () = terminate => {}
    }
}
