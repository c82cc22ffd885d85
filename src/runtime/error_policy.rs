//! # Error Policy
//!
//! Requeue decisions for failed reconciliations.
//!
//! Backoff state is tracked per Gateway so that one failing resource does not
//! slow down retries of the others. The state is cleared by the reconciler
//! after a clean pass, or by [`forget_missing`] once the Gateway is gone.

use crate::controller::backoff::BackoffState;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::controller::source::AddressSource;
use crate::crd::Gateway;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle a reconciliation error with Fibonacci backoff
pub fn handle_reconciliation_error<S: AddressSource>(
    obj: Arc<Gateway>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler<S>>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();
    let resource_key = backoff_key(Some(&namespace), &name);

    error!(
        resource.namespace = %namespace,
        resource.name = %name,
        retryable = error.is_retryable(),
        error = %error,
        "Reconciliation error"
    );
    observability::metrics::increment_reconciliation_errors(error.reason());

    let (delay, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(resource_key.clone())
                .or_insert_with(|| BackoffState::new(ctx.backoff_min_secs, ctx.backoff_max_secs));
            let delay = state.record_failure();
            (delay, state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using maximum backoff", e);
            (Duration::from_secs(ctx.backoff_max_secs), 0)
        }
    };

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        resource = %resource_key,
        error_count,
        "Retrying in {}s at {}",
        delay.as_secs(),
        next_trigger_time.to_rfc3339()
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// Drop the retry state of a Gateway the runtime no longer finds.
///
/// Failing Gateways that get deleted are never reconciled cleanly again, so
/// without this their entry would stay forever.
pub fn forget_missing<S: AddressSource>(
    ctx: &Reconciler<S>,
    namespace: Option<&str>,
    name: &str,
) {
    ctx.clear_backoff(&backoff_key(namespace, name));
}

fn backoff_key(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{name}", namespace.unwrap_or_default())
}
