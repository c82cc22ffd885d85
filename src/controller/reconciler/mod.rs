//! # Reconciler
//!
//! Keeps `Gateway.spec.addresses` in line with the ready Nodes or Pods that
//! reference the Gateway.
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch the Gateway (missing: done)
//! 2. Check the enablement label (absent or not "true": done)
//! 3. Resolve desired addresses
//! 4. Compare with current addresses (equal: done)
//! 5. Replace addresses, bump the revision annotation
//! 6. Persist with optimistic concurrency

pub mod reconcile;
pub mod revision;
pub mod types;

pub use reconcile::{is_enabled, reconcile, reconcile_gateway};
pub use revision::{bump_revision, current_revision};
pub use types::{ReconcileOutcome, Reconciler, ReconcilerError};
