//! # Controller
//!
//! Core controller modules for the Gateway Node Controller.
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `mapper`: Node/Pod change to Gateway reconcile request
//! - `reconciler`: Core reconciliation logic
//! - `reference`: Label encoding of Gateway back-references
//! - `resolver`: Desired address computation
//! - `server`: HTTP server for metrics and health checks
//! - `source`: Node and Pod address sources
//! - `store`: Kubernetes API access used by the reconciler

pub mod backoff;
pub mod mapper;
pub mod reconciler;
pub mod reference;
pub mod resolver;
pub mod server;
pub mod source;
pub mod store;
