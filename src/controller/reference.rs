//! # Back-References
//!
//! Encoding of "this object belongs to Gateway `namespace/name`" into the
//! labels of a Node or Pod.
//!
//! Two encodings exist:
//!
//! - **Composite key** (Nodes): one label `gateway-node.k8s.itergia.com/<ns>.<name>`
//!   with an empty value. A Node may carry several of them.
//! - **Flat pair** (Pods): `.../owning-namespace=<ns>` and `.../owning-name=<name>`.
//!
//! Decoding never fails loudly: labels that look like a back-reference but
//! are malformed are treated as absent.

use crate::constants::{GATEWAY_NODE_KEY_PREFIX, GATEWAY_POD_NAMESPACE_KEY, GATEWAY_POD_NAME_KEY};
use crate::crd::GatewayRef;
use std::collections::BTreeMap;

/// Label encoding of a Gateway back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceCodec {
    CompositeKey,
    FlatPair,
}

impl ReferenceCodec {
    /// Labels to attach to a secondary resource so that it references `id`.
    #[must_use]
    pub fn encode(&self, id: &GatewayRef) -> BTreeMap<String, String> {
        match self {
            ReferenceCodec::CompositeKey => {
                BTreeMap::from([(composite_key(id), String::new())])
            }
            ReferenceCodec::FlatPair => BTreeMap::from([
                (GATEWAY_POD_NAMESPACE_KEY.to_string(), id.namespace.clone()),
                (GATEWAY_POD_NAME_KEY.to_string(), id.name.clone()),
            ]),
        }
    }

    /// Gateway referenced by `labels`, if any.
    ///
    /// For the composite encoding the first well-formed key in label order wins.
    /// A composite key must name both parts: `prefix + ".edge"` is not a
    /// reference. The flat pair differs here and maps a missing namespace
    /// label to the empty namespace; only its name label is mandatory.
    #[must_use]
    pub fn decode(&self, labels: &BTreeMap<String, String>) -> Option<GatewayRef> {
        match self {
            ReferenceCodec::CompositeKey => labels
                .iter()
                .find_map(|(key, value)| decode_composite(key, value)),
            ReferenceCodec::FlatPair => {
                let name = labels.get(GATEWAY_POD_NAME_KEY).filter(|n| !n.is_empty())?;
                // A missing namespace label means the empty (default) namespace.
                let namespace = labels
                    .get(GATEWAY_POD_NAMESPACE_KEY)
                    .cloned()
                    .unwrap_or_default();
                Some(GatewayRef::new(namespace, name.clone()))
            }
        }
    }

    /// Label selector matching every secondary resource that references `id`.
    #[must_use]
    pub fn selector(&self, id: &GatewayRef) -> String {
        match self {
            // An empty value selects on `key=` which only matches empty label values.
            ReferenceCodec::CompositeKey => format!("{}=", composite_key(id)),
            ReferenceCodec::FlatPair => format!(
                "{}={},{}={}",
                GATEWAY_POD_NAMESPACE_KEY, id.namespace, GATEWAY_POD_NAME_KEY, id.name
            ),
        }
    }
}

fn composite_key(id: &GatewayRef) -> String {
    format!("{GATEWAY_NODE_KEY_PREFIX}{}.{}", id.namespace, id.name)
}

fn decode_composite(key: &str, value: &str) -> Option<GatewayRef> {
    let rest = key.strip_prefix(GATEWAY_NODE_KEY_PREFIX)?;
    if !value.is_empty() {
        return None;
    }
    // Namespaces cannot contain '.', names can: split on the first one.
    let (namespace, name) = rest.split_once('.')?;
    if namespace.is_empty() || name.is_empty() {
        return None;
    }
    Some(GatewayRef::new(namespace, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_composite_encode_decode() {
        let id = GatewayRef::new("ingress", "edge");
        let encoded = ReferenceCodec::CompositeKey.encode(&id);
        assert_eq!(
            encoded,
            labels(&[("gateway-node.k8s.itergia.com/ingress.edge", "")])
        );
        assert_eq!(ReferenceCodec::CompositeKey.decode(&encoded), Some(id));
    }

    #[test]
    fn test_composite_name_keeps_later_dots() {
        let decoded = ReferenceCodec::CompositeKey
            .decode(&labels(&[("gateway-node.k8s.itergia.com/ingress.edge.v2", "")]));
        assert_eq!(decoded, Some(GatewayRef::new("ingress", "edge.v2")));
    }

    #[test]
    fn test_composite_without_separator_is_ignored() {
        let decoded = ReferenceCodec::CompositeKey
            .decode(&labels(&[("gateway-node.k8s.itergia.com/ingressedge", "")]));
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_composite_with_empty_parts_is_ignored() {
        let codec = ReferenceCodec::CompositeKey;
        assert_eq!(
            codec.decode(&labels(&[("gateway-node.k8s.itergia.com/.edge", "")])),
            None
        );
        assert_eq!(
            codec.decode(&labels(&[("gateway-node.k8s.itergia.com/ingress.", "")])),
            None
        );
    }

    #[test]
    fn test_composite_with_value_is_not_a_reference() {
        let decoded = ReferenceCodec::CompositeKey
            .decode(&labels(&[("gateway-node.k8s.itergia.com/ingress.edge", "yes")]));
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_composite_skips_malformed_and_unrelated_labels() {
        let decoded = ReferenceCodec::CompositeKey.decode(&labels(&[
            ("kubernetes.io/hostname", "worker-1"),
            ("gateway-node.k8s.itergia.com/broken", ""),
            ("gateway-node.k8s.itergia.com/ingress.edge", ""),
        ]));
        assert_eq!(decoded, Some(GatewayRef::new("ingress", "edge")));
    }

    #[test]
    fn test_composite_selector() {
        let selector = ReferenceCodec::CompositeKey.selector(&GatewayRef::new("ingress", "edge"));
        assert_eq!(selector, "gateway-node.k8s.itergia.com/ingress.edge=");
    }

    #[test]
    fn test_flat_pair_encode_decode() {
        let id = GatewayRef::new("ingress", "edge");
        let encoded = ReferenceCodec::FlatPair.encode(&id);
        assert_eq!(encoded.len(), 2);
        assert_eq!(ReferenceCodec::FlatPair.decode(&encoded), Some(id));
    }

    #[test]
    fn test_flat_pair_missing_namespace_is_empty_namespace() {
        let decoded = ReferenceCodec::FlatPair
            .decode(&labels(&[("gateway-pod.k8s.itergia.com/owning-name", "edge")]));
        assert_eq!(decoded, Some(GatewayRef::new("", "edge")));
    }

    #[test]
    fn test_flat_pair_requires_name() {
        let codec = ReferenceCodec::FlatPair;
        assert_eq!(
            codec.decode(&labels(&[(
                "gateway-pod.k8s.itergia.com/owning-namespace",
                "ingress"
            )])),
            None
        );
        assert_eq!(
            codec.decode(&labels(&[
                ("gateway-pod.k8s.itergia.com/owning-namespace", "ingress"),
                ("gateway-pod.k8s.itergia.com/owning-name", ""),
            ])),
            None
        );
    }

    #[test]
    fn test_flat_pair_selector() {
        let selector = ReferenceCodec::FlatPair.selector(&GatewayRef::new("ingress", "edge"));
        assert_eq!(
            selector,
            "gateway-pod.k8s.itergia.com/owning-namespace=ingress,gateway-pod.k8s.itergia.com/owning-name=edge"
        );
    }
}
