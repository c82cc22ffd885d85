//! Common test utilities
//!
//! An in-memory [`ResourceStore`] plus builders for Gateways, Nodes and Pods.
//! The store enforces `resourceVersion` on replace the way the API server does.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use gateway_node_controller::constants::{
    CONTROLLER_ENABLED_LABEL, GATEWAY_ADDRESS_TYPE, REVISION_ANNOTATION,
};
use gateway_node_controller::controller::reference::ReferenceCodec;
use gateway_node_controller::controller::store::{ResourceStore, StoreError};
use gateway_node_controller::crd::{Gateway, GatewayAddress, GatewayRef, GatewaySpec};
use k8s_openapi::api::core::v1::{
    HostIP, Node, NodeAddress, NodeCondition, NodeStatus, Pod, PodCondition, PodStatus,
};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct State {
    gateways: BTreeMap<GatewayRef, Gateway>,
    nodes: BTreeMap<String, Node>,
    pods: BTreeMap<(String, String), Pod>,
    next_resource_version: u64,
    replace_calls: usize,
    list_calls: usize,
    fail_lists: bool,
    list_delay: Option<Duration>,
    modify_on_list: Option<GatewayRef>,
}

impl State {
    fn next_rv(&mut self) -> String {
        self.next_resource_version += 1;
        self.next_resource_version.to_string()
    }
}

/// In-memory cluster
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_gateway(&self, mut gateway: Gateway) {
        let mut state = self.state.lock().unwrap();
        gateway.metadata.resource_version = Some(state.next_rv());
        let id = GatewayRef::from_gateway(&gateway).expect("gateway has a namespace");
        state.gateways.insert(id, gateway);
    }

    pub fn gateway(&self, id: &GatewayRef) -> Option<Gateway> {
        self.state.lock().unwrap().gateways.get(id).cloned()
    }

    /// Simulate a write by another client.
    pub fn touch_gateway(&self, id: &GatewayRef) {
        let mut state = self.state.lock().unwrap();
        let rv = state.next_rv();
        if let Some(gw) = state.gateways.get_mut(id) {
            gw.metadata.resource_version = Some(rv);
        }
    }

    pub fn put_node(&self, node: Node) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(node.name_any(), node);
    }

    pub fn put_pod(&self, pod: Pod) {
        let key = (pod.namespace().unwrap_or_default(), pod.name_any());
        self.state.lock().unwrap().pods.insert(key, pod);
    }

    pub fn replace_calls(&self) -> usize {
        self.state.lock().unwrap().replace_calls
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_lists = fail;
    }

    pub fn delay_lists(&self, delay: Duration) {
        self.state.lock().unwrap().list_delay = Some(delay);
    }

    /// Modify `id` behind the reconciler's back while it lists secondaries.
    pub fn modify_on_list(&self, id: GatewayRef) {
        self.state.lock().unwrap().modify_on_list = Some(id);
    }

    fn begin_list(&self) -> Result<Option<Duration>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.fail_lists {
            return Err(StoreError::Timeout(Duration::from_secs(30)));
        }
        if let Some(id) = state.modify_on_list.take() {
            let rv = state.next_rv();
            if let Some(gw) = state.gateways.get_mut(&id) {
                gw.metadata.resource_version = Some(rv);
            }
        }
        Ok(state.list_delay)
    }
}

/// Equality-based label selector as produced by [`ReferenceCodec::selector`].
pub fn selector_matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    selector
        .split(',')
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
            None => labels.contains_key(term),
        })
}

async fn wait(delay: Option<Duration>, cancel: &CancellationToken) -> Result<(), StoreError> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    if let Some(delay) = delay {
        tokio::select! {
            () = cancel.cancelled() => return Err(StoreError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
    Ok(())
}

#[async_trait]
impl ResourceStore for FakeStore {
    async fn get_gateway(
        &self,
        id: &GatewayRef,
        cancel: &CancellationToken,
    ) -> Result<Option<Gateway>, StoreError> {
        wait(None, cancel).await?;
        Ok(self.gateway(id))
    }

    async fn list_nodes(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Node>, StoreError> {
        let delay = self.begin_list()?;
        wait(delay, cancel).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .nodes
            .values()
            .filter(|n| selector_matches(selector, n.labels()))
            .cloned()
            .collect())
    }

    async fn list_pods(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Pod>, StoreError> {
        let delay = self.begin_list()?;
        wait(delay, cancel).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .values()
            .filter(|p| selector_matches(selector, p.labels()))
            .cloned()
            .collect())
    }

    async fn replace_gateway(
        &self,
        gateway: &Gateway,
        cancel: &CancellationToken,
    ) -> Result<Gateway, StoreError> {
        wait(None, cancel).await?;
        let id = GatewayRef::from_gateway(gateway).expect("gateway has a namespace");
        let mut state = self.state.lock().unwrap();
        state.replace_calls += 1;

        let current_rv = state
            .gateways
            .get(&id)
            .and_then(|gw| gw.metadata.resource_version.clone());
        if current_rv.is_none() || current_rv != gateway.metadata.resource_version {
            return Err(StoreError::Conflict(id.to_string()));
        }

        let mut stored = gateway.clone();
        stored.metadata.resource_version = Some(state.next_rv());
        state.gateways.insert(id, stored.clone());
        Ok(stored)
    }
}

#[derive(Debug)]
pub struct GatewayBuilder {
    gateway: Gateway,
}

impl GatewayBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        let mut gateway = Gateway::new(
            name,
            GatewaySpec {
                gateway_class_name: "envoy".to_string(),
                addresses: vec![],
                extra: BTreeMap::from([(
                    "listeners".to_string(),
                    serde_json::json!([{ "name": "http", "port": 80, "protocol": "HTTP" }]),
                )]),
            },
        );
        gateway.metadata.namespace = Some(namespace.to_string());
        Self { gateway }
    }

    pub fn enabled(self) -> Self {
        self.label(CONTROLLER_ENABLED_LABEL, "true")
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.gateway
            .labels_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn revision(mut self, value: &str) -> Self {
        self.gateway
            .annotations_mut()
            .insert(REVISION_ANNOTATION.to_string(), value.to_string());
        self
    }

    pub fn addresses(mut self, values: &[&str]) -> Self {
        self.gateway.spec.addresses = values.iter().copied().map(GatewayAddress::ip).collect();
        self
    }

    pub fn build(self) -> Gateway {
        self.gateway
    }
}

pub fn node(name: &str, gateways: &[&GatewayRef], ready: bool, internal_ips: &[&str]) -> Node {
    let mut labels = BTreeMap::new();
    for id in gateways {
        labels.extend(ReferenceCodec::CompositeKey.encode(id));
    }
    let mut addresses = vec![NodeAddress {
        type_: "Hostname".to_string(),
        address: name.to_string(),
    }];
    addresses.extend(internal_ips.iter().map(|ip| NodeAddress {
        type_: "InternalIP".to_string(),
        address: (*ip).to_string(),
    }));

    let mut node = Node {
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            addresses: Some(addresses),
            ..Default::default()
        }),
        ..Default::default()
    };
    node.metadata.name = Some(name.to_string());
    node.metadata.labels = Some(labels);
    node
}

pub fn pod(namespace: &str, name: &str, gateway: &GatewayRef, ready: bool, host_ips: &[&str]) -> Pod {
    let mut pod = Pod {
        status: Some(PodStatus {
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            host_ip: host_ips.first().map(|ip| (*ip).to_string()),
            host_ips: Some(
                host_ips
                    .iter()
                    .map(|ip| HostIP { ip: (*ip).to_string() })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    };
    pod.metadata.namespace = Some(namespace.to_string());
    pod.metadata.name = Some(name.to_string());
    pod.metadata.labels = Some(ReferenceCodec::FlatPair.encode(gateway));
    pod
}

pub fn address_values(gateway: &Gateway) -> Vec<&str> {
    gateway
        .spec
        .addresses
        .iter()
        .map(|a| {
            assert_eq!(a.type_.as_deref(), Some(GATEWAY_ADDRESS_TYPE));
            a.value.as_str()
        })
        .collect()
}

pub fn revision_of(gateway: &Gateway) -> Option<&str> {
    gateway
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(REVISION_ANNOTATION))
        .map(String::as_str)
}
