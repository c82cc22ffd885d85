//! # Gateway
//!
//! Typed view of `gateway.networking.k8s.io/v1` `Gateway`.

use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gateway API Gateway resource
///
/// Only `gatewayClassName` and `addresses` are interpreted. Every other spec
/// field is carried through untouched so that replacing the object never
/// drops listeners or infrastructure settings owned by someone else.
///
/// # Example
///
/// ```yaml
/// apiVersion: gateway.networking.k8s.io/v1
/// kind: Gateway
/// metadata:
///   name: edge
///   namespace: ingress
///   labels:
///     controller.itergia.com/gateway-node: "true"
/// spec:
///   gatewayClassName: envoy
///   addresses:
///     - type: IPAddress
///       value: 10.0.0.2
///   listeners:
///     - name: http
///       port: 80
///       protocol: HTTP
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, PartialEq)]
#[kube(
    kind = "Gateway",
    group = "gateway.networking.k8s.io",
    version = "v1",
    namespaced,
    derive = "PartialEq",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    pub gateway_class_name: String,
    /// Addresses requested for the Gateway, maintained by this controller
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<GatewayAddress>,
    /// Remaining spec fields (listeners, infrastructure, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Single entry of `spec.addresses`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct GatewayAddress {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    pub value: String,
}

impl GatewayAddress {
    /// Address tagged with the type this controller writes
    pub fn ip(value: impl Into<String>) -> Self {
        Self {
            type_: Some(crate::constants::GATEWAY_ADDRESS_TYPE.to_string()),
            value: value.into(),
        }
    }
}

/// Identity of a Gateway, the payload of a reconcile request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GatewayRef {
    pub namespace: String,
    pub name: String,
}

impl GatewayRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a Gateway object; `None` if the object has no namespace.
    pub fn from_gateway(gateway: &Gateway) -> Option<Self> {
        let namespace = gateway.namespace()?;
        Some(Self::new(namespace, gateway.name_any()))
    }

    /// Key for the runtime work queue
    pub fn object_ref(&self) -> ObjectRef<Gateway> {
        ObjectRef::new(&self.name).within(&self.namespace)
    }
}

impl fmt::Display for GatewayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
