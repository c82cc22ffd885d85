//! # Address Sources
//!
//! The kinds of secondary resource that can back a Gateway.
//!
//! An [`AddressSource`] knows how its objects reference a Gateway, how to
//! list the objects referencing one, when an object is ready, and which of
//! its addresses are advertised. The source is picked once at startup; the
//! resolver and reconciler are generic over it.

use crate::constants::{CONDITION_TRUE, NODE_INTERNAL_IP, READY_CONDITION};
use crate::controller::reference::ReferenceCodec;
use crate::controller::store::{ResourceStore, StoreError};
use crate::crd::GatewayRef;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::Resource;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Capability interface of a secondary resource kind
#[async_trait]
pub trait AddressSource: Debug + Send + Sync + 'static {
    type Object: Resource<DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Short name used in logs and metrics labels
    const NAME: &'static str;

    /// Back-reference encoding used by this kind
    fn codec(&self) -> ReferenceCodec;

    /// Objects referencing `id`, filtered server-side.
    async fn list_matching(
        &self,
        store: &dyn ResourceStore,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Object>, StoreError>;

    /// Whether the object may receive traffic
    fn is_ready(&self, obj: &Self::Object) -> bool;

    /// Addresses the object contributes, in the order it reports them
    fn extract_addresses(&self, obj: &Self::Object) -> Vec<String>;
}

/// Nodes referencing a Gateway through the composite label key
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeSource;

#[async_trait]
impl AddressSource for NodeSource {
    type Object = Node;

    const NAME: &'static str = "node";

    fn codec(&self) -> ReferenceCodec {
        ReferenceCodec::CompositeKey
    }

    async fn list_matching(
        &self,
        store: &dyn ResourceStore,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<Node>, StoreError> {
        store.list_nodes(&self.codec().selector(id), cancel).await
    }

    fn is_ready(&self, node: &Node) -> bool {
        node.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == READY_CONDITION && c.status == CONDITION_TRUE)
            })
    }

    fn extract_addresses(&self, node: &Node) -> Vec<String> {
        node.status
            .as_ref()
            .and_then(|s| s.addresses.as_ref())
            .map(|addresses| {
                addresses
                    .iter()
                    .filter(|a| a.type_ == NODE_INTERNAL_IP)
                    .map(|a| a.address.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Pods referencing a Gateway through the owning namespace/name labels
#[derive(Debug, Clone, Copy, Default)]
pub struct PodSource;

#[async_trait]
impl AddressSource for PodSource {
    type Object = Pod;

    const NAME: &'static str = "pod";

    fn codec(&self) -> ReferenceCodec {
        ReferenceCodec::FlatPair
    }

    async fn list_matching(
        &self,
        store: &dyn ResourceStore,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<Pod>, StoreError> {
        store.list_pods(&self.codec().selector(id), cancel).await
    }

    fn is_ready(&self, pod: &Pod) -> bool {
        pod.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == READY_CONDITION && c.status == CONDITION_TRUE)
            })
    }

    fn extract_addresses(&self, pod: &Pod) -> Vec<String> {
        let Some(status) = pod.status.as_ref() else {
            return Vec::new();
        };
        match status.host_ips.as_ref() {
            Some(host_ips) if !host_ips.is_empty() => {
                host_ips.iter().map(|h| h.ip.clone()).collect()
            }
            _ => status.host_ip.iter().cloned().collect(),
        }
    }
}
