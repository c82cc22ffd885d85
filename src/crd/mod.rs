//! # Resource Types
//!
//! Types for the primary resource managed by the controller.
//!
//! The Gateway CRD itself belongs to the Gateway API project; this crate only
//! models the parts of it the controller reads and writes.
//!
//! - `gateway.rs` - `Gateway` resource, its address list and identity

mod gateway;

pub use gateway::{Gateway, GatewayAddress, GatewayRef, GatewaySpec};
