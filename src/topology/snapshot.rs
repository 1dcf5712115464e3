//! Snapshot encoding, integrity checks and duplication.
//!
//! Snapshots cross the boundary to storage as JSON. Anything decoded from
//! outside is re-validated before use, since a hand-edited or truncated
//! save can break peer symmetry.

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use rand::Rng;

use super::model::{Topology, TopologyError};
use super::types::{interface_id, Link};

impl Topology {
    /// Encode as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, TopologyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a JSON snapshot and verify its structural invariants
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        let topology: Topology = serde_json::from_str(json)?;
        topology.verify_integrity()?;
        info!(
            "Decoded topology '{}' with {} device(s) and {} link(s)",
            topology.name,
            topology.devices.len(),
            topology.links.len()
        );
        Ok(topology)
    }

    /// Check every structural invariant of the graph
    ///
    /// Checks for:
    /// - Unique device, interface and link ids
    /// - Exactly `port_count` interfaces per device, with distinct names
    /// - Interfaces naming the device that actually holds them
    /// - Links joining two existing interfaces on different devices
    /// - No interface appearing in more than one link
    /// - Peer references that are symmetric and match the link set exactly
    pub fn verify_integrity(&self) -> Result<(), TopologyError> {
        let corrupt = |msg: String| -> Result<(), TopologyError> { Err(TopologyError::CorruptSnapshot(msg)) };

        let mut device_ids = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for device in &self.devices {
            if !device_ids.insert(device.id()) {
                return corrupt(format!("duplicate device id '{}'", device.id()));
            }
            if let Some(reason) = device.shape_problem() {
                return corrupt(format!("device '{}': {}", device.id(), reason));
            }
            for iface in device.interfaces() {
                if iface.owner_device_id() != device.id() {
                    return corrupt(format!(
                        "interface '{}' claims owner '{}' but sits on '{}'",
                        iface.id(),
                        iface.owner_device_id(),
                        device.id()
                    ));
                }
                if owners.insert(iface.id(), device.id()).is_some() {
                    return corrupt(format!("duplicate interface id '{}'", iface.id()));
                }
            }
        }

        let mut link_ids = HashSet::new();
        let mut linked: HashMap<&str, &str> = HashMap::new();
        for link in &self.links {
            if !link_ids.insert(link.id.as_str()) {
                return corrupt(format!("duplicate link id '{}'", link.id));
            }
            let (Some(owner_a), Some(owner_b)) = (
                owners.get(link.interface_a_id.as_str()),
                owners.get(link.interface_b_id.as_str()),
            ) else {
                return corrupt(format!("link '{}' references a missing interface", link.id));
            };
            if owner_a == owner_b {
                return corrupt(format!("link '{}' loops back onto device '{}'", link.id, owner_a));
            }
            for (end, other) in [
                (&link.interface_a_id, &link.interface_b_id),
                (&link.interface_b_id, &link.interface_a_id),
            ] {
                if linked.insert(end.as_str(), other.as_str()).is_some() {
                    return corrupt(format!("interface '{}' is used by more than one link", end));
                }
            }
        }

        for iface in self.devices.iter().flat_map(|d| d.interfaces()) {
            if iface.peer_interface_id() != linked.get(iface.id()).copied() {
                return corrupt(format!(
                    "peer of interface '{}' does not match the link table",
                    iface.id()
                ));
            }
        }

        Ok(())
    }

    /// Deep copy under fresh topology, device and link ids.
    ///
    /// Interface ids follow their device; names, addressing, MACs and the
    /// cabling shape are preserved.
    pub fn duplicate(&self) -> Topology {
        self.duplicate_with_rng(&mut rand::thread_rng())
    }

    /// [`Topology::duplicate`] drawing fresh ids from the given generator
    pub fn duplicate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Topology {
        let mut taken: HashSet<String> = self.devices.iter().map(|d| d.id().to_string()).collect();
        let mut device_map: HashMap<&str, String> = HashMap::new();
        for device in &self.devices {
            let fresh = loop {
                let candidate = format!("dev-{:08x}", rng.gen::<u32>());
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
            };
            device_map.insert(device.id(), fresh);
        }

        // Interface ids are "{device}:{name}", so remapping goes through the owner.
        let remap_interface = |old_interface_id: &str| -> Option<String> {
            let owner = self.owner_of(old_interface_id)?;
            let iface = owner.interface(old_interface_id)?;
            Some(interface_id(device_map.get(owner.id())?, &iface.name))
        };

        let devices = self
            .devices
            .iter()
            .map(|device| device.rehomed(&device_map[device.id()], &remap_interface))
            .collect();

        let links = self
            .links
            .iter()
            .enumerate()
            .filter_map(|(i, link)| {
                Some(Link {
                    id: format!("link-{}", i + 1),
                    interface_a_id: remap_interface(&link.interface_a_id)?,
                    interface_b_id: remap_interface(&link.interface_b_id)?,
                })
            })
            .collect::<Vec<_>>();

        let copy = Topology {
            id: format!("topo-{:08x}", rng.gen::<u32>()),
            name: self.name.clone(),
            devices,
            link_seq: links.len() as u64,
            links,
        };
        debug!("Duplicated topology '{}' as {}", self.id, copy.id);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Device;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn linked_pair() -> Topology {
        let mut topology = Topology::new("t1", "Lab");
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.1.20")).unwrap();
        topology.connect("pc1:eth0", "pc2:eth0").unwrap();
        topology
    }

    #[test]
    fn test_json_round_trip() {
        let topology = linked_pair();
        let json = topology.to_json().unwrap();
        let decoded = Topology::from_json(&json).unwrap();
        assert_eq!(decoded.devices(), topology.devices());
        assert_eq!(decoded.links(), topology.links());
        assert_eq!(decoded.name, "Lab");
    }

    #[test]
    fn test_decode_rejects_asymmetric_peers() {
        let json = linked_pair().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["links"] = serde_json::json!([]);
        let err = Topology::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, TopologyError::CorruptSnapshot(_)));
    }

    #[test]
    fn test_decode_rejects_dangling_link() {
        let json = linked_pair().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["links"][0]["interface_b_id"] = serde_json::json!("ghost:eth0");
        assert!(Topology::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_port_count() {
        let json = linked_pair().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let mut extra = value["devices"][0]["interfaces"][0].clone();
        extra["id"] = serde_json::json!("pc1:eth1");
        extra["name"] = serde_json::json!("eth1");
        extra.as_object_mut().unwrap().remove("peer_interface_id");
        value["devices"][0]["interfaces"].as_array_mut().unwrap().push(extra);

        let err = Topology::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, TopologyError::CorruptSnapshot(msg) if msg.contains("expected 1")));
    }

    #[test]
    fn test_decode_rejects_repeated_interface_name() {
        let mut topology = Topology::new("t1", "Lab");
        topology.add_device(Device::router("r1", "Router-1")).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();
        value["devices"][0]["interfaces"][1]["name"] = serde_json::json!("eth0");

        let err = Topology::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, TopologyError::CorruptSnapshot(msg) if msg.contains("used twice")));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Topology::from_json("{not json"), Err(TopologyError::Json(_))));
    }

    #[test]
    fn test_duplicate_uses_fresh_ids() {
        let topology = linked_pair();
        let copy = topology.duplicate_with_rng(&mut StdRng::seed_from_u64(3));
        assert_ne!(copy.id, topology.id);
        assert_eq!(copy.devices().len(), 2);
        assert_eq!(copy.links().len(), 1);
        for device in copy.devices() {
            assert!(topology.find_device(device.id()).is_none());
        }
        copy.verify_integrity().unwrap();
        let names: Vec<&str> = copy.devices().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["PC-1", "PC-2"]);
        assert_eq!(copy.devices()[0].primary_ip(), Some("192.168.1.10"));
    }

    #[test]
    fn test_duplicate_keeps_link_sequence_unique() {
        let mut copy = linked_pair().duplicate();
        copy.add_device(Device::pc("pc3", "PC-3")).unwrap();
        copy.add_device(Device::pc("pc4", "PC-4")).unwrap();
        let link_id = copy.connect("pc3:eth0", "pc4:eth0").unwrap();
        assert_eq!(link_id, "link-2");
    }
}
