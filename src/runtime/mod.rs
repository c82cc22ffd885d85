//! # Runtime
//!
//! Process wiring around the reconciler.
//!
//! - `initialization`: rustls, tracing, metrics, HTTP server, Kubernetes client
//! - `watch_loop`: kube-runtime controller setup
//! - `error_policy`: requeue with per-resource backoff

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

use crate::config::{AddressSourceKind, ControllerConfig};
use crate::controller::reconciler::Reconciler;
use crate::controller::source::{AddressSource, NodeSource, PodSource};
use anyhow::Result;
use initialization::InitializationResult;
use std::sync::Arc;

/// Initialize everything and run the controller for the configured source.
pub async fn run(config: ControllerConfig) -> Result<()> {
    let init = initialization::initialize(&config).await?;
    match config.address_source {
        AddressSourceKind::Node => run_with_source(init, NodeSource, &config).await,
        AddressSourceKind::Pod => run_with_source(init, PodSource, &config).await,
    }
    Ok(())
}

async fn run_with_source<S: AddressSource + Clone>(
    init: InitializationResult,
    source: S,
    config: &ControllerConfig,
) {
    let reconciler = Arc::new(
        Reconciler::new(init.store, source, init.cancel)
            .with_backoff(config.backoff_min_secs, config.backoff_max_secs)
            .with_resync_interval(config.resync_interval()),
    );
    watch_loop::run_watch_loop(init.client, reconciler, init.server_state, config).await;
}
