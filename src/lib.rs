//! Gateway Node Controller Library
//!
//! Keeps Gateway addresses in sync with the Nodes or Pods that reference the
//! Gateway through labels.
//!
//! ## Quick Start
//!
//! ```rust
//! use gateway_node_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
