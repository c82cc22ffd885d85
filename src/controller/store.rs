//! # Resource Store
//!
//! Access to the Kubernetes API used during reconciliation.
//!
//! The reconciler only ever talks to the cluster through [`ResourceStore`],
//! which keeps the reconciliation logic testable without an API server.
//! [`KubeStore`] is the production implementation on top of `kube::Api`.
//!
//! Every call takes a [`CancellationToken`] and is bounded by a deadline.
//! Cancellation and deadline expiry surface as errors; nothing is retried here.

use crate::crd::{Gateway, GatewayRef};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, ResourceExt};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The object changed since it was read (HTTP 409)
    #[error("conflict updating {0}: object was modified concurrently")]
    Conflict(String),
    #[error("kubernetes API request failed: {0}")]
    Api(#[source] kube::Error),
    #[error("kubernetes API request timed out after {0:?}")]
    Timeout(Duration),
    #[error("kubernetes API request cancelled")]
    Cancelled,
}

impl StoreError {
    /// Whether the runtime should try again later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Cancelled)
    }
}

/// Operations the reconciler needs from the cluster
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a Gateway; `Ok(None)` when it does not exist.
    async fn get_gateway(
        &self,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Option<Gateway>, StoreError>;

    /// List Nodes matching a label selector.
    async fn list_nodes(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Node>, StoreError>;

    /// List Pods in all namespaces matching a label selector.
    async fn list_pods(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Pod>, StoreError>;

    /// Replace a Gateway, guarded by its `resourceVersion`.
    async fn replace_gateway(
        &self,
        gateway: &Gateway,
        cancel: &CancellationToken,
    ) -> Result<Gateway, StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    timeout: Duration,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn bounded<T, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, kube::Error>> + Send,
    {
        with_deadline(self.timeout, cancel, fut).await
    }
}

/// Run an API call until it completes, `timeout` elapses or `cancel` fires.
pub async fn with_deadline<T, F>(
    timeout: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, kube::Error>> + Send,
{
    tokio::select! {
        () = cancel.cancelled() => Err(StoreError::Cancelled),
        res = tokio::time::timeout(timeout, fut) => match res {
            Ok(inner) => inner.map_err(StoreError::Api),
            Err(_elapsed) => Err(StoreError::Timeout(timeout)),
        },
    }
}

/// Turn an HTTP 409 from a write into [`StoreError::Conflict`].
pub fn conflict_on_409<T>(result: Result<T, StoreError>, id: &str) -> Result<T, StoreError> {
    match result {
        Err(StoreError::Api(kube::Error::Api(api_err))) if api_err.code == 409 => {
            Err(StoreError::Conflict(id.to_string()))
        }
        other => other,
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_gateway(
        &self,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Option<Gateway>, StoreError> {
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &id.namespace);
        self.bounded(cancel, api.get_opt(&id.name)).await
    }

    async fn list_nodes(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Node>, StoreError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let params = ListParams::default().labels(selector);
        let list = self.bounded(cancel, api.list(&params)).await?;
        debug!(selector, count = list.items.len(), "listed nodes");
        Ok(list.items)
    }

    async fn list_pods(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Pod>, StoreError> {
        let api: Api<Pod> = Api::all(self.client.clone());
        let params = ListParams::default().labels(selector);
        let list = self.bounded(cancel, api.list(&params)).await?;
        debug!(selector, count = list.items.len(), "listed pods");
        Ok(list.items)
    }

    async fn replace_gateway(
        &self,
        gateway: &Gateway,
        cancel: &CancellationToken,
    ) -> Result<Gateway, StoreError> {
        let namespace = gateway.namespace().unwrap_or_default();
        let name = gateway.name_any();
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), &namespace);
        // The object keeps the resourceVersion it was read with, so the API
        // server rejects the write if anything changed in between.
        let result = self
            .bounded(cancel, api.replace(&name, &PostParams::default(), gateway))
            .await;
        conflict_on_409(result, &format!("{namespace}/{name}"))
    }
}
