//! # NetLab - Network topology lab for teaching computer networking
//!
//! This library holds the algorithmic core of a networking lab: learners
//! build a virtual topology of PCs, servers, switches, hubs and routers, and
//! the lab checks it against task requirements and animates simplified ARP
//! and ICMP traffic across it.
//!
//! ## Architecture
//!
//! - `ip`: dotted-quad parsing and subnet arithmetic
//! - `topology`: the device/interface/link graph and its JSON snapshot form
//! - `simulation`: path discovery, ARP caching and paced ping/ARP event streams
//! - `validation`: basic sanity rules and task requirement scoring
//! - `config`: lab configuration (simulator pacing, defaults, log level)
//! - `loader`: YAML/JSON file loading for configs, tasks and topologies
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::Duration;
//! use netlab::simulation::{NetworkSimulator, SimulationEvent};
//! use netlab::topology::{Device, Topology};
//! use netlab::validation::validate_basic;
//!
//! let mut topology = Topology::new("lab-1", "Two PCs");
//! topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10"))?;
//! topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.1.20"))?;
//! topology.connect("pc1:eth0", "pc2:eth0")?;
//!
//! assert_eq!(validate_basic(&topology).score, 100);
//!
//! let mut simulator = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
//! let events: Vec<SimulationEvent> = simulator.simulate_ping("pc1", "192.168.1.20", 1).collect();
//! assert_eq!(events.last(), Some(&SimulationEvent::SimulationEnded { success: true }));
//! # Ok::<(), netlab::topology::TopologyError>(())
//! ```
//!
//! ## Task Format
//!
//! ```yaml
//! id: small-lan
//! title: Connect two PCs through a switch
//! requirements:
//!   - kind: device_count
//!     device_type: switch
//!     min: 1
//!   - kind: ping_successful
//!     from: PC-1
//!     to: PC-2
//! ```
//!
//! ## Error Handling
//!
//! Graph mutations and snapshot decoding return typed `TopologyError`s.
//! Simulation faults are reported as events and validation failures as
//! entries of the `ValidationResult`. File loading uses `color_eyre` for
//! errors with context.

pub mod config;
pub mod ip;
pub mod loader;
pub mod simulation;
pub mod topology;
pub mod validation;
