//! Network topology module.
//!
//! This module contains the device/interface/link graph a learner builds,
//! its mutation and query primitives, and the snapshot boundary used by
//! storage collaborators.

pub mod types;
pub mod model;
pub mod connections;
pub mod snapshot;

// Re-export key types for easier access
pub use model::{Topology, TopologyError};
pub use types::{generate_mac, interface_id, Device, DeviceKind, Interface, Link, Position};
