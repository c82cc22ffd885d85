//! # Types
//!
//! Core types for the reconciler.

use crate::controller::backoff::BackoffState;
use crate::controller::source::AddressSource;
use crate::controller::store::{ResourceStore, StoreError};
use crate::crd::GatewayAddress;
use std::collections::HashMap;
use std::num::ParseIntError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The revision annotation holds something other than a non-negative integer
    #[error("parsing annotation {annotation:?} value {value:?}: {source}")]
    InvalidRevision {
        annotation: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("annotation {0:?} cannot be incremented past u64::MAX")]
    RevisionOverflow(&'static str),
}

impl ReconcilerError {
    /// Whether a later attempt may succeed without outside intervention.
    ///
    /// Every error is still handed back to the runtime, which keeps retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcilerError::Store(e) => e.is_retryable(),
            ReconcilerError::InvalidRevision { .. } | ReconcilerError::RevisionOverflow(_) => false,
        }
    }

    /// Short label for metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Store(StoreError::Conflict(_)) => "conflict",
            ReconcilerError::Store(StoreError::Api(_)) => "api",
            ReconcilerError::Store(StoreError::Timeout(_)) => "timeout",
            ReconcilerError::Store(StoreError::Cancelled) => "cancelled",
            ReconcilerError::InvalidRevision { .. } | ReconcilerError::RevisionOverflow(_) => {
                "invalid-revision"
            }
        }
    }
}

/// Which exit of the reconciliation state machine was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The Gateway no longer exists
    NotFound,
    /// The Gateway has not opted in
    Disabled,
    /// Addresses already match; nothing written
    Unchanged,
    /// Addresses replaced and revision bumped
    Updated {
        revision: u64,
        addresses: Vec<GatewayAddress>,
    },
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::NotFound => "not-found",
            ReconcileOutcome::Disabled => "disabled",
            ReconcileOutcome::Unchanged => "unchanged",
            ReconcileOutcome::Updated { .. } => "updated",
        }
    }
}

/// Shared reconciliation context
pub struct Reconciler<S: AddressSource> {
    pub store: Arc<dyn ResourceStore>,
    pub source: S,
    /// Cancelled on shutdown; aborts in-flight API calls
    pub cancel: CancellationToken,
    /// Retry state per Gateway (namespace/name), owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
    pub backoff_min_secs: u64,
    pub backoff_max_secs: u64,
    pub resync_interval: Option<Duration>,
}

impl<S: AddressSource> std::fmt::Debug for Reconciler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("source", &S::NAME)
            .field("resync_interval", &self.resync_interval)
            .finish_non_exhaustive()
    }
}

impl<S: AddressSource> Reconciler<S> {
    pub fn new(store: Arc<dyn ResourceStore>, source: S, cancel: CancellationToken) -> Self {
        use crate::constants::{DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS};
        Self {
            store,
            source,
            cancel,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            resync_interval: None,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.backoff_min_secs = min_secs;
        self.backoff_max_secs = max_secs;
        self
    }

    #[must_use]
    pub fn with_resync_interval(mut self, interval: Option<Duration>) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Forget the retry history of a Gateway after it reconciled cleanly
    pub fn clear_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(key);
        }
    }
}
