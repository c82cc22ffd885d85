//! # Event Mapper
//!
//! Turns a changed Node or Pod into the reconcile request of the Gateway it
//! references.
//!
//! Runs inline on the watch stream, so it is a pure function of the object:
//! no I/O, no locking. The input kind is fixed per watch registration by the
//! [`AddressSource`] type parameter, so no runtime kind check is needed.

use crate::controller::source::AddressSource;
use crate::crd::{Gateway, GatewayRef};
use crate::observability;
use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use tracing::trace;

/// Gateway referenced by a secondary object, if any.
pub fn map_to_gateway<S: AddressSource>(source: &S, obj: &S::Object) -> Option<GatewayRef> {
    source.codec().decode(obj.labels())
}

/// Reconcile request for the runtime work queue: zero or one entry.
///
/// A Node labelled for several Gateways only enqueues the first reference in
/// label-key order. It still contributes addresses to every Gateway it
/// references, but the others are not reconciled by this event and stay stale
/// until their own Gateway or another secondary object changes, or the
/// periodic resync (`RESYNC_INTERVAL_SECS`, off by default) fires.
pub fn map_to_request<S: AddressSource>(source: &S, obj: &S::Object) -> Option<ObjectRef<Gateway>> {
    let id = map_to_gateway(source, obj)?;
    trace!(
        source = S::NAME,
        object = %obj.name_any(),
        gateway = %id,
        "mapped change to gateway"
    );
    observability::metrics::increment_events_mapped(S::NAME);
    Some(id.object_ref())
}
