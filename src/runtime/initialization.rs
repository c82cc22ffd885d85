//! # Initialization
//!
//! Controller startup: rustls setup, tracing, metrics, server startup and
//! Kubernetes client creation.

use crate::config::{ControllerConfig, LogFormat};
use crate::controller::server::{start_server, ServerState};
use crate::controller::store::KubeStore;
use crate::observability;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Everything the watch loop needs, independent of the address source
pub struct InitializationResult {
    pub client: Client,
    pub store: Arc<KubeStore>,
    pub server_state: Arc<ServerState>,
    /// Cancelled on shutdown
    pub cancel: CancellationToken,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_serving", &self.server_state.serving())
            .finish_non_exhaustive()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`.
pub fn init_tracing(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "gateway_node_controller={level},kube=warn,kube_runtime=warn",
            level = config.log_level.to_lowercase()
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing subscriber already initialized: {e}");
    }
}

/// Initialize the controller runtime
pub async fn initialize(config: &ControllerConfig) -> Result<InitializationResult> {
    init_tracing(config);

    // Required for rustls 0.23+ when no default provider is set via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        info!("rustls crypto provider already installed");
    }

    info!("Starting Gateway Node Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        address_source = %config.address_source,
        api_timeout_secs = config.api_timeout_secs,
        "Loaded controller configuration"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let store = Arc::new(KubeStore::new(client.clone(), config.api_timeout()));

    Ok(InitializationResult {
        client,
        store,
        server_state,
        cancel: CancellationToken::new(),
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = std::time::Duration::from_secs(config.server_startup_timeout_secs);
    let poll_interval = std::time::Duration::from_millis(config.server_poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.serving() {
            info!("HTTP server is accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
