//! # Gateway Node Controller
//!
//! A Kubernetes controller that keeps `Gateway.spec.addresses` in sync with the
//! IP addresses of the Nodes or Pods that back each Gateway.
//!
//! ## Overview
//!
//! 1. **Watching Gateways** - Reconciles every `Gateway` labelled for this controller
//! 2. **Watching Nodes or Pods** - Maps label back-references to Gateway reconcile requests
//! 3. **Resolving addresses** - Collects addresses of ready backing objects
//! 4. **Writing on change** - Replaces the Gateway only when the address list differs,
//!    bumping a revision annotation
//!
//! Configuration is read from environment variables, see `ControllerConfig`.

use anyhow::{Context, Result};
use gateway_node_controller::config::ControllerConfig;
use gateway_node_controller::runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from_env().context("Failed to load controller configuration")?;
    runtime::run(config).await
}
