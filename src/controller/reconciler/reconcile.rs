//! # Reconciliation Logic
//!
//! One pass of Gateway reconciliation:
//!
//! 1. Fetch the Gateway; gone means done
//! 2. Skip it unless it carries the enablement label
//! 3. Resolve the desired addresses from ready Nodes/Pods
//! 4. Stop if they already match `spec.addresses`
//! 5. Replace the addresses and bump the revision annotation
//! 6. Write the Gateway back under optimistic concurrency
//!
//! Errors are returned unchanged; retries belong to the runtime's error policy.

use crate::constants::{CONTROLLER_ENABLED_LABEL, CONTROLLER_ENABLED_VALUE};
use crate::controller::reconciler::revision::bump_revision;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::controller::resolver::resolve;
use crate::controller::source::AddressSource;
use crate::crd::{Gateway, GatewayRef};
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

/// Whether the Gateway has opted in to address management
pub fn is_enabled(gateway: &Gateway) -> bool {
    gateway
        .labels()
        .get(CONTROLLER_ENABLED_LABEL)
        .is_some_and(|v| v == CONTROLLER_ENABLED_VALUE)
}

/// Reconcile the Gateway identified by `id`.
///
/// Performs at most one write, and only when the resolved address list differs
/// from the stored one.
pub async fn reconcile_gateway<S: AddressSource>(
    ctx: &Reconciler<S>,
    id: &GatewayRef,
    cancel: &CancellationToken,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let Some(gateway) = ctx.store.get_gateway(id, cancel).await? else {
        debug!(gateway = %id, "Gateway not found, nothing to reconcile");
        return Ok(ReconcileOutcome::NotFound);
    };

    if !is_enabled(&gateway) {
        debug!(gateway = %id, "Gateway not enabled for this controller");
        return Ok(ReconcileOutcome::Disabled);
    }

    let addresses = resolve(&ctx.source, ctx.store.as_ref(), id, cancel).await?;

    if addresses == gateway.spec.addresses {
        info!(name = %id, "No updates to Gateway");
        return Ok(ReconcileOutcome::Unchanged);
    }

    let mut updated = gateway;
    updated.spec.addresses = addresses;
    let revision = bump_revision(&mut updated)?;

    info!(
        name = %id,
        revision,
        addresses = ?updated.spec.addresses.iter().map(|a| a.value.as_str()).collect::<Vec<_>>(),
        "Updating Gateway"
    );

    let written = ctx.store.replace_gateway(&updated, cancel).await?;
    Ok(ReconcileOutcome::Updated {
        revision,
        addresses: written.spec.addresses,
    })
}

/// Entry point for the kube-runtime controller.
///
/// The cached object is only used for its identity; the Gateway is re-read so
/// every pass works from current state.
pub async fn reconcile<S: AddressSource>(
    gateway: Arc<Gateway>,
    ctx: Arc<Reconciler<S>>,
) -> Result<Action, ReconcilerError> {
    let Some(id) = GatewayRef::from_gateway(&gateway) else {
        return Ok(Action::await_change());
    };

    let span = tracing::info_span!(
        "reconcile",
        resource.namespace = %id.namespace,
        resource.name = %id.name,
        resource.kind = "Gateway",
        address_source = S::NAME,
    );

    async move {
        let start = Instant::now();
        observability::metrics::increment_reconciliations();

        // Cancelled with the controller-wide token on shutdown.
        let cancel = ctx.cancel.child_token();
        let result = reconcile_gateway(ctx.as_ref(), &id, &cancel).await;
        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let outcome = result?;
        match &outcome {
            ReconcileOutcome::Updated { .. } => observability::metrics::increment_gateway_updates(),
            ReconcileOutcome::Unchanged => observability::metrics::increment_noop_reconciliations(),
            ReconcileOutcome::NotFound | ReconcileOutcome::Disabled => {}
        }
        debug!(outcome = outcome.as_str(), "reconciliation finished");

        ctx.clear_backoff(&id.to_string());
        Ok::<_, ReconcilerError>(match ctx.resync_interval {
            Some(interval) => Action::requeue(interval),
            None => Action::await_change(),
        })
    }
    .instrument(span)
    .await
}
