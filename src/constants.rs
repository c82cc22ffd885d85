//! # Constants
//!
//! Label, annotation and default values shared across the controller.
//!
//! The label and annotation keys form the persisted state layout: they are
//! read from (and, for the revision annotation, written to) objects in the
//! cluster, so changing any of them is a breaking change for existing
//! deployments.

/// Prefix of the composite back-reference label on Nodes.
///
/// The full key is `prefix + namespace + "." + name` with an empty value.
pub const GATEWAY_NODE_KEY_PREFIX: &str = "gateway-node.k8s.itergia.com/";

/// Label on Pods holding the namespace of the owning Gateway.
pub const GATEWAY_POD_NAMESPACE_KEY: &str = "gateway-pod.k8s.itergia.com/owning-namespace";

/// Label on Pods holding the name of the owning Gateway.
pub const GATEWAY_POD_NAME_KEY: &str = "gateway-pod.k8s.itergia.com/owning-name";

/// Label on a Gateway that opts it in to address management.
pub const CONTROLLER_ENABLED_LABEL: &str = "controller.itergia.com/gateway-node";

/// The only value of [`CONTROLLER_ENABLED_LABEL`] that enables management.
pub const CONTROLLER_ENABLED_VALUE: &str = "true";

/// Annotation holding the number of address-changing updates applied to a Gateway.
pub const REVISION_ANNOTATION: &str = "gateway-node-controller.itergia.com/revision";

/// Address type written into `Gateway.spec.addresses`.
pub const GATEWAY_ADDRESS_TYPE: &str = "IPAddress";

/// Node address type that contributes to a Gateway.
pub const NODE_INTERNAL_IP: &str = "InternalIP";

/// Condition type consulted for Node and Pod readiness.
pub const READY_CONDITION: &str = "Ready";

/// Condition status meaning the condition holds.
pub const CONDITION_TRUE: &str = "True";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default deadline for a single Kubernetes API call (seconds)
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default first retry delay after a failed reconciliation (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Default cap on the retry delay after repeated failures (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Periodic resync interval; zero disables it
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 0;

/// Default server-side watch timeout (must stay below the API server's 295s limit)
pub const DEFAULT_WATCH_TIMEOUT_SECS: u32 = 290;

/// Default bound on reconciliations running at once
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;
