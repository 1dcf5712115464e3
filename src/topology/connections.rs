//! Link management and neighbor queries.

use log::debug;

use super::model::{Topology, TopologyError};
use super::types::{Device, Link};

impl Topology {
    /// Cable two interfaces together and return the new link id.
    ///
    /// Both interfaces must exist, sit on different devices and be free.
    pub fn connect(&mut self, interface_a_id: &str, interface_b_id: &str) -> Result<String, TopologyError> {
        let a = self.find_interface(interface_a_id).ok_or_else(|| TopologyError::UnknownInterface {
            interface_id: interface_a_id.to_string(),
        })?;
        let b = self.find_interface(interface_b_id).ok_or_else(|| TopologyError::UnknownInterface {
            interface_id: interface_b_id.to_string(),
        })?;

        if a.owner_device_id() == b.owner_device_id() {
            return Err(TopologyError::SameDevice {
                device_id: a.owner_device_id().to_string(),
            });
        }
        if let Some(busy) = [a, b].into_iter().find(|iface| iface.is_connected()) {
            return Err(TopologyError::AlreadyConnected {
                interface_id: busy.id().to_string(),
            });
        }

        let link_id = self.next_link_id();
        self.set_peer(interface_a_id, Some(interface_b_id.to_string()));
        self.set_peer(interface_b_id, Some(interface_a_id.to_string()));
        self.links.push(Link {
            id: link_id.clone(),
            interface_a_id: interface_a_id.to_string(),
            interface_b_id: interface_b_id.to_string(),
        });
        debug!("Connected {} <-> {} as {}", interface_a_id, interface_b_id, link_id);
        Ok(link_id)
    }

    /// Connect two devices through the first free interface on each
    pub fn connect_devices(&mut self, device_a_id: &str, device_b_id: &str) -> Result<String, TopologyError> {
        if device_a_id == device_b_id {
            return Err(TopologyError::SameDevice {
                device_id: device_a_id.to_string(),
            });
        }
        let a = self.free_interface_id(device_a_id)?;
        let b = self.free_interface_id(device_b_id)?;
        self.connect(&a, &b)
    }

    fn free_interface_id(&self, device_id: &str) -> Result<String, TopologyError> {
        let device = self.find_device(device_id).ok_or_else(|| TopologyError::UnknownDevice {
            device_id: device_id.to_string(),
        })?;
        device
            .free_interface()
            .map(|iface| iface.id().to_string())
            .ok_or_else(|| TopologyError::NoFreeInterface {
                device_id: device_id.to_string(),
            })
    }

    /// Remove a link and clear the peer reference on both ends.
    ///
    /// Returns `None` if no such link exists.
    pub fn disconnect(&mut self, link_id: &str) -> Option<Link> {
        let index = self.links.iter().position(|link| link.id == link_id)?;
        let link = self.links.remove(index);
        self.set_peer(&link.interface_a_id, None);
        self.set_peer(&link.interface_b_id, None);
        debug!("Disconnected {}", link.id);
        Some(link)
    }

    fn set_peer(&mut self, interface_id: &str, peer: Option<String>) {
        if let Some(iface) = self.find_interface_mut(interface_id) {
            iface.set_peer(peer);
        }
    }

    /// Link attached to an interface, if any
    pub fn link_for_interface(&self, interface_id: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.touches(interface_id))
    }

    /// Links touching any interface of a device
    pub fn links_of_device(&self, device_id: &str) -> Vec<&Link> {
        let Some(device) = self.find_device(device_id) else {
            return Vec::new();
        };
        self.links
            .iter()
            .filter(|link| device.interfaces().iter().any(|iface| link.touches(iface.id())))
            .collect()
    }

    /// Devices exactly one link away, de-duplicated, in interface order
    pub fn neighbors(&self, device_id: &str) -> Vec<&Device> {
        let Some(device) = self.find_device(device_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&Device> = Vec::new();
        for peer_id in device.interfaces().iter().filter_map(|iface| iface.peer_interface_id()) {
            if let Some(peer_device) = self.owner_of(peer_id) {
                if !neighbors.iter().any(|d| d.id() == peer_device.id()) {
                    neighbors.push(peer_device);
                }
            }
        }
        neighbors
    }

    /// Ids of [`Topology::neighbors`]
    pub fn neighbor_ids(&self, device_id: &str) -> Vec<&str> {
        self.neighbors(device_id).into_iter().map(|d| d.id()).collect()
    }
}
