//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use gateway_node_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Address sources and the store seam
pub use crate::controller::source::{AddressSource, NodeSource, PodSource};
pub use crate::controller::store::{KubeStore, ResourceStore, StoreError};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, reconcile_gateway, ReconcileOutcome, Reconciler, ReconcilerError,
};

// Label back-references
pub use crate::controller::reference::ReferenceCodec;

// Config types
pub use crate::config::{AddressSourceKind, ControllerConfig, LogFormat};
