//! Graph reachability over the cabling.
//!
//! Every linked device is a node, switches and hubs included, so chains
//! through layer-2 gear are found. There is no layer-3 routing: reachability
//! is purely graph reachability.

use std::collections::{HashMap, HashSet, VecDeque};

use log::trace;

use crate::topology::Topology;

/// Shortest device-hop path between two devices.
///
/// Returns `[from]` when both ids name the same existing device and an empty
/// path when either device is unknown or no chain of links joins them.
///
/// The search always starts from whichever endpoint comes first in device
/// order, so `find_path(b, a)` is exactly `find_path(a, b)` reversed even
/// when several shortest paths tie.
pub fn find_path(topology: &Topology, from_device_id: &str, to_device_id: &str) -> Vec<String> {
    let position = |id: &str| topology.devices().iter().position(|d| d.id() == id);
    let (Some(from_index), Some(to_index)) = (position(from_device_id), position(to_device_id)) else {
        return Vec::new();
    };
    if from_device_id == to_device_id {
        return vec![from_device_id.to_string()];
    }
    if to_index < from_index {
        let mut path = search(topology, to_device_id, from_device_id);
        path.reverse();
        return path;
    }
    search(topology, from_device_id, to_device_id)
}

fn search(topology: &Topology, from_device_id: &str, to_device_id: &str) -> Vec<String> {

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::from([from_device_id]);
    let mut visited: HashSet<&str> = HashSet::from([from_device_id]);

    while let Some(current) = queue.pop_front() {
        for neighbor in topology.neighbor_ids(current) {
            if !visited.insert(neighbor) {
                continue;
            }
            parent.insert(neighbor, current);
            if neighbor == to_device_id {
                return unwind(&parent, from_device_id, to_device_id);
            }
            queue.push_back(neighbor);
        }
    }

    trace!("No path from {} to {}", from_device_id, to_device_id);
    Vec::new()
}

fn unwind(parent: &HashMap<&str, &str>, from: &str, to: &str) -> Vec<String> {
    let mut path = vec![to.to_string()];
    let mut node = to;
    while node != from {
        match parent.get(node) {
            Some(&prev) => {
                path.push(prev.to_string());
                node = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Connected components, each listed in device order, ordered by their
/// first device.
pub fn connected_components(topology: &Topology) -> Vec<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for start in topology.device_ids() {
        if visited.contains(start) {
            continue;
        }

        let mut members: HashSet<&str> = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            members.insert(node);
            for neighbor in topology.neighbor_ids(node) {
                if !visited.contains(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        components.push(
            topology
                .device_ids()
                .into_iter()
                .filter(|id| members.contains(id))
                .map(str::to_string)
                .collect(),
        );
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Device;

    fn chain() -> Topology {
        // pc1 - sw1 - r1 - sw2 - pc2
        let mut topology = Topology::new("t", "Chain");
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10")).unwrap();
        topology.add_device(Device::switch("sw1", "SW-1")).unwrap();
        topology.add_device(Device::router("r1", "R-1")).unwrap();
        topology.add_device(Device::switch("sw2", "SW-2")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.2.10")).unwrap();
        topology.connect_devices("pc1", "sw1").unwrap();
        topology.connect_devices("sw1", "r1").unwrap();
        topology.connect_devices("r1", "sw2").unwrap();
        topology.connect_devices("sw2", "pc2").unwrap();
        topology
    }

    #[test]
    fn test_path_through_layer2_devices() {
        let topology = chain();
        assert_eq!(find_path(&topology, "pc1", "pc2"), vec!["pc1", "sw1", "r1", "sw2", "pc2"]);
    }

    #[test]
    fn test_path_to_self() {
        let topology = chain();
        assert_eq!(find_path(&topology, "r1", "r1"), vec!["r1"]);
        assert!(find_path(&topology, "ghost", "ghost").is_empty());
    }

    #[test]
    fn test_shortest_path_preferred() {
        let mut topology = chain();
        topology.connect_devices("sw1", "sw2").unwrap();
        assert_eq!(find_path(&topology, "pc1", "pc2"), vec!["pc1", "sw1", "sw2", "pc2"]);
    }

    /// Two equal-length routes between r1 and r2 whose interface order disagrees
    fn diamond() -> Topology {
        let mut topology = Topology::new("t", "Diamond");
        topology.add_device(Device::router("r1", "R-1")).unwrap();
        topology.add_device(Device::switch("x", "SW-X")).unwrap();
        topology.add_device(Device::switch("y", "SW-Y")).unwrap();
        topology.add_device(Device::router("r2", "R-2")).unwrap();
        topology.connect("r1:eth0", "x:port0").unwrap();
        topology.connect("r1:eth1", "y:port0").unwrap();
        topology.connect("r2:eth0", "y:port1").unwrap();
        topology.connect("r2:eth1", "x:port1").unwrap();
        topology
    }

    #[test]
    fn test_tied_paths_are_symmetric() {
        let topology = diamond();
        let forward = find_path(&topology, "r1", "r2");
        let mut backward = find_path(&topology, "r2", "r1");
        backward.reverse();
        assert_eq!(forward, vec!["r1", "x", "r2"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_components() {
        let mut topology = chain();
        topology.add_device(Device::pc("pc3", "PC-3")).unwrap();
        let components = connected_components(&topology);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 5);
        assert_eq!(components[1], vec!["pc3"]);
        assert!(connected_components(&Topology::default()).is_empty());
    }
}
