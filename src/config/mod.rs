//! # Configuration
//!
//! Process-level configuration loaded from environment variables.

pub mod controller;

pub use controller::{AddressSourceKind, ControllerConfig, LogFormat};
