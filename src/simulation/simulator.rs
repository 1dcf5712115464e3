//! The network simulator.
//!
//! A [`NetworkSimulator`] borrows one topology for its whole lifetime and
//! owns the per-device ARP caches built up while it runs. Simulations are
//! produced as lazy event iterators, see [`PingSimulation`] and
//! [`ArpSimulation`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::{debug, trace};
use serde::Serialize;

use super::arp::ArpSimulation;
use super::path::find_path;
use super::ping::PingSimulation;
use crate::config::SimulatorConfig;
use crate::topology::{Device, Interface, Topology};

/// Pacing used when no configuration is supplied
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(400);

pub struct NetworkSimulator<'a> {
    topology: &'a Topology,
    /// device id -> (ip -> mac)
    arp_tables: HashMap<String, BTreeMap<String, String>>,
    step_delay: Duration,
    packet_seq: u64,
    topology_lookups: usize,
}

impl<'a> NetworkSimulator<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self::with_step_delay(topology, DEFAULT_STEP_DELAY)
    }

    /// Simulator pacing its event streams with `step_delay`. Zero disables pauses.
    pub fn with_step_delay(topology: &'a Topology, step_delay: Duration) -> Self {
        Self {
            topology,
            arp_tables: HashMap::new(),
            step_delay,
            packet_seq: 0,
            topology_lookups: 0,
        }
    }

    pub fn from_config(topology: &'a Topology, config: &SimulatorConfig) -> Self {
        Self::with_step_delay(topology, config.step_delay)
    }

    pub fn topology(&self) -> &'a Topology {
        self.topology
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn set_step_delay(&mut self, step_delay: Duration) {
        self.step_delay = step_delay;
    }

    /// Shortest device-hop path, see [`find_path`]
    pub fn find_path(&self, from_device_id: &str, to_device_id: &str) -> Vec<String> {
        find_path(self.topology, from_device_id, to_device_id)
    }

    /// MAC address for `target_ip` as seen from `from_device_id`.
    ///
    /// Answers from the device's cache when possible. A miss looks the
    /// address up in the topology and caches the result.
    pub fn resolve_arp(&mut self, from_device_id: &str, target_ip: &str) -> Option<String> {
        self.resolve_arp_traced(from_device_id, target_ip).map(|(mac, _)| mac)
    }

    /// Like [`Self::resolve_arp`], also reporting whether the cache answered
    pub(crate) fn resolve_arp_traced(&mut self, from_device_id: &str, target_ip: &str) -> Option<(String, bool)> {
        if let Some(mac) = self.arp_tables.get(from_device_id).and_then(|table| table.get(target_ip)) {
            trace!("ARP cache hit on {} for {}", from_device_id, target_ip);
            return Some((mac.clone(), true));
        }

        self.topology_lookups += 1;
        let iface = self.topology.find_interface_by_ip(target_ip)?;
        let mac = iface.mac_address().to_string();
        self.learn(from_device_id, target_ip, &mac);
        Some((mac, false))
    }

    pub(crate) fn learn(&mut self, device_id: &str, ip: &str, mac: &str) {
        debug!("ARP table of {}: {} -> {}", device_id, ip, mac);
        self.arp_tables
            .entry(device_id.to_string())
            .or_default()
            .insert(ip.to_string(), mac.to_string());
    }

    /// Copy of one device's ARP cache, ordered by IP string
    pub fn arp_table(&self, device_id: &str) -> BTreeMap<String, String> {
        self.arp_tables.get(device_id).cloned().unwrap_or_default()
    }

    pub fn clear_arp_table(&mut self, device_id: &str) {
        if let Some(table) = self.arp_tables.get_mut(device_id) {
            table.clear();
        }
    }

    pub fn clear_all_tables(&mut self) {
        self.arp_tables.clear();
    }

    /// Number of ARP cache misses that had to consult the topology
    pub fn topology_lookups(&self) -> usize {
        self.topology_lookups
    }

    pub(crate) fn next_packet_id(&mut self) -> String {
        self.packet_seq += 1;
        format!("pkt-{}", self.packet_seq)
    }

    /// Reachability between every unordered pair of devices that have an IP
    pub fn check_connectivity(&self) -> ConnectivityMatrix {
        let with_ip: Vec<&Device> = self
            .topology
            .devices()
            .iter()
            .filter(|d| d.primary_ip().is_some())
            .collect();

        let mut entries = Vec::new();
        for (i, a) in with_ip.iter().enumerate() {
            for b in &with_ip[i + 1..] {
                entries.push(Reachability {
                    from: a.id().to_string(),
                    to: b.id().to_string(),
                    reachable: !self.find_path(a.id(), b.id()).is_empty(),
                });
            }
        }
        ConnectivityMatrix { entries }
    }

    /// Lazily produced ping exchange of `count` echo requests
    pub fn simulate_ping<'s>(
        &'s mut self,
        source_device_id: &str,
        destination_ip: &str,
        count: u32,
    ) -> PingSimulation<'s, 'a> {
        PingSimulation::new(self, source_device_id, destination_ip, count)
    }

    /// Lazily produced ARP broadcast and reply
    pub fn simulate_arp<'s>(&'s mut self, source_device_id: &str, target_ip: &str) -> ArpSimulation<'s, 'a> {
        ArpSimulation::new(self, source_device_id, target_ip)
    }
}

/// Source endpoint of a simulation: the device and its primary interface
pub(crate) struct Endpoint<'a> {
    pub device: &'a Device,
    pub interface: &'a Interface,
    pub ip: &'a str,
}

/// Reasons a simulation cannot start from a given source
pub(crate) fn source_endpoint<'a>(topology: &'a Topology, device_id: &str) -> Result<Endpoint<'a>, String> {
    let device = topology
        .find_device(device_id)
        .ok_or_else(|| format!("Source device '{}' not found", device_id))?;
    let interface = device
        .primary_interface()
        .ok_or_else(|| format!("{} has no IP address configured", device.name))?;
    let ip = interface
        .ip_address
        .as_deref()
        .ok_or_else(|| format!("{} has no IP address configured", device.name))?;
    Ok(Endpoint { device, interface, ip })
}

/// Pairwise reachability, as produced by [`NetworkSimulator::check_connectivity`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityMatrix {
    entries: Vec<Reachability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reachability {
    pub from: String,
    pub to: String,
    pub reachable: bool,
}

impl ConnectivityMatrix {
    pub fn entries(&self) -> &[Reachability] {
        &self.entries
    }

    /// Looks the pair up in either order; pairs not in the matrix are unreachable
    pub fn is_reachable(&self, a: &str, b: &str) -> bool {
        self.entries
            .iter()
            .find(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
            .map(|e| e.reachable)
            .unwrap_or(false)
    }

    pub fn fully_connected(&self) -> bool {
        self.entries.iter().all(|e| e.reachable)
    }

    pub fn unreachable_pairs(&self) -> impl Iterator<Item = &Reachability> {
        self.entries.iter().filter(|e| !e.reachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(linked: bool) -> Topology {
        let mut topology = Topology::new("t", "Pair");
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.1.20")).unwrap();
        topology.add_device(Device::switch("sw1", "Switch-1")).unwrap();
        if linked {
            topology.connect("pc1:eth0", "pc2:eth0").unwrap();
        }
        topology
    }

    #[test]
    fn test_resolve_arp_caches() {
        let topology = pair(true);
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let expected = topology.find_interface("pc2:eth0").unwrap().mac_address().to_string();

        assert_eq!(sim.resolve_arp("pc1", "192.168.1.20"), Some(expected.clone()));
        assert_eq!(sim.topology_lookups(), 1);
        assert_eq!(sim.resolve_arp("pc1", "192.168.1.20"), Some(expected.clone()));
        assert_eq!(sim.topology_lookups(), 1);
        assert_eq!(sim.arp_table("pc1").get("192.168.1.20"), Some(&expected));

        sim.clear_arp_table("pc1");
        assert!(sim.arp_table("pc1").is_empty());
        sim.resolve_arp("pc1", "192.168.1.20");
        assert_eq!(sim.topology_lookups(), 2);
    }

    #[test]
    fn test_resolve_arp_unknown_ip() {
        let topology = pair(true);
        let mut sim = NetworkSimulator::new(&topology);
        assert_eq!(sim.resolve_arp("pc1", "10.0.0.1"), None);
        assert!(sim.arp_table("pc1").is_empty());
    }

    #[test]
    fn test_connectivity_matrix_skips_devices_without_ip() {
        let topology = pair(false);
        let sim = NetworkSimulator::new(&topology);
        let matrix = sim.check_connectivity();
        assert_eq!(matrix.entries().len(), 1);
        assert!(!matrix.is_reachable("pc2", "pc1"));
        assert!(!matrix.fully_connected());

        let topology = pair(true);
        let matrix = NetworkSimulator::new(&topology).check_connectivity();
        assert!(matrix.is_reachable("pc1", "pc2"));
        assert!(matrix.fully_connected());
    }

    #[test]
    fn test_packet_ids_are_sequential() {
        let topology = pair(true);
        let mut sim = NetworkSimulator::new(&topology);
        assert_eq!(sim.next_packet_id(), "pkt-1");
        assert_eq!(sim.next_packet_id(), "pkt-2");
    }
}
