//! Packet-level network simulation.
//!
//! The simulator borrows a [`Topology`](crate::topology::Topology) read-only
//! and turns ping and ARP exchanges into ordered [`SimulationEvent`]s for an
//! animation or console layer. Delays between events only pace the output.
//! Running the same scenario with a zero delay yields identical events.

pub mod arp;
pub mod events;
pub mod packet;
pub mod path;
pub mod ping;
pub mod simulator;

pub use arp::ArpSimulation;
pub use events::SimulationEvent;
pub use packet::{Packet, PacketKind, BROADCAST_MAC};
pub use path::{connected_components, find_path};
pub use ping::PingSimulation;
pub use simulator::{ConnectivityMatrix, NetworkSimulator, Reachability, DEFAULT_STEP_DELAY};
