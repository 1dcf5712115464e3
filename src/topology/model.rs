//! The topology aggregate root.
//!
//! A [`Topology`] owns its devices (which own their interfaces) and the
//! links between interfaces. Every public mutation leaves the graph in a
//! consistent state: ids are unique, peer references are symmetric and
//! each peer pair is backed by exactly one link.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{Device, DeviceKind, Interface, Link};
use crate::ip;

/// Structural errors raised by topology mutations and snapshot decoding
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Duplicate id: {id}")]
    DuplicateId { id: String },

    #[error("Interface {interface_id} is already connected")]
    AlreadyConnected { interface_id: String },

    #[error("Cannot connect device {device_id} to itself")]
    SameDevice { device_id: String },

    #[error("Unknown interface: {interface_id}")]
    UnknownInterface { interface_id: String },

    #[error("Unknown device: {device_id}")]
    UnknownDevice { device_id: String },

    #[error("Device {device_id} has no free interface")]
    NoFreeInterface { device_id: String },

    #[error("Device {device_id} is malformed: {reason}")]
    MalformedDevice { device_id: String, reason: String },

    #[error("Corrupt topology snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Failed to decode topology snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Complete graph of one virtual network instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub(super) devices: Vec<Device>,
    #[serde(default)]
    pub(super) links: Vec<Link>,
    #[serde(skip)]
    pub(super) link_seq: u64,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new("topology", "")
    }
}

impl Topology {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            devices: Vec::new(),
            links: Vec::new(),
            link_seq: 0,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Add a device. Fails if its id or any of its interface ids is taken,
    /// or if its interfaces do not fit its kind.
    pub fn add_device(&mut self, device: Device) -> Result<(), TopologyError> {
        if let Some(reason) = device.shape_problem() {
            return Err(TopologyError::MalformedDevice {
                device_id: device.id().to_string(),
                reason,
            });
        }
        if self.find_device(device.id()).is_some() {
            return Err(TopologyError::DuplicateId { id: device.id().to_string() });
        }
        if let Some(iface) = device.interfaces().iter().find(|i| self.find_interface(i.id()).is_some()) {
            return Err(TopologyError::DuplicateId { id: iface.id().to_string() });
        }
        // Peers belong to the topology; a device arrives unconnected.
        let mut device = device;
        for iface in device.interfaces_mut() {
            iface.set_peer(None);
        }
        debug!("Adding {} '{}' ({})", device.kind(), device.name, device.id());
        self.devices.push(device);
        Ok(())
    }

    /// Remove a device together with every link touching it.
    ///
    /// Far-end peer references are cleared. Returns `None` if no such device exists.
    pub fn remove_device(&mut self, device_id: &str) -> Option<Device> {
        let index = self.devices.iter().position(|d| d.id() == device_id)?;
        let link_ids: Vec<String> = self
            .links
            .iter()
            .filter(|link| {
                self.devices[index]
                    .interfaces()
                    .iter()
                    .any(|iface| link.touches(iface.id()))
            })
            .map(|link| link.id.clone())
            .collect();
        for link_id in &link_ids {
            self.disconnect(link_id);
        }
        let device = self.devices.remove(index);
        debug!("Removed device '{}' and {} link(s)", device.name, link_ids.len());
        Some(device)
    }

    pub fn find_device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == device_id)
    }

    pub(crate) fn find_device_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.id() == device_id)
    }

    /// Device owning an interface with this IP
    pub fn find_device_by_ip(&self, ip: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.has_ip(ip))
    }

    /// Case-insensitive match on the display name. Non-ASCII letters fold too.
    pub fn find_device_by_name(&self, name: &str) -> Option<&Device> {
        let wanted = name.trim().to_lowercase();
        self.devices.iter().find(|d| d.name.to_lowercase() == wanted)
    }

    /// Resolve a device by id, falling back to a name match
    pub fn resolve_device(&self, id_or_name: &str) -> Option<&Device> {
        self.find_device(id_or_name).or_else(|| self.find_device_by_name(id_or_name))
    }

    pub fn find_interface(&self, interface_id: &str) -> Option<&Interface> {
        self.devices.iter().find_map(|d| d.interface(interface_id))
    }

    pub(crate) fn find_interface_mut(&mut self, interface_id: &str) -> Option<&mut Interface> {
        self.devices.iter_mut().find_map(|d| d.interface_mut(interface_id))
    }

    /// Interface holding exactly this IP
    pub fn find_interface_by_ip(&self, ip: &str) -> Option<&Interface> {
        self.devices
            .iter()
            .flat_map(|d| d.interfaces())
            .find(|iface| iface.ip_address.as_deref() == Some(ip))
    }

    pub fn find_link(&self, link_id: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.id == link_id)
    }

    /// Device that owns the interface with this id
    pub fn owner_of(&self, interface_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.interface(interface_id).is_some())
    }

    pub fn device_ids(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.id()).collect()
    }

    pub fn devices_by_kind(&self, kind: DeviceKind) -> Vec<&Device> {
        self.devices.iter().filter(|d| d.kind() == kind).collect()
    }

    pub fn device_count_by_kind(&self, kind: DeviceKind) -> usize {
        self.devices.iter().filter(|d| d.kind() == kind).count()
    }

    /// Every configured IP, in device and interface order
    pub fn all_ip_addresses(&self) -> Vec<&str> {
        self.devices
            .iter()
            .flat_map(|d| d.interfaces())
            .filter_map(|iface| iface.ip_address.as_deref())
            .collect()
    }

    /// Distinct network addresses across all well-formed interface IPs
    pub fn subnets(&self) -> BTreeSet<String> {
        self.devices
            .iter()
            .flat_map(|d| d.interfaces())
            .filter_map(|iface| {
                let ip = iface.ip_address.as_deref()?;
                ip::is_valid_ipv4(ip).then(|| ip::get_subnet(ip, iface.effective_mask()))
            })
            .collect()
    }

    /// Set or clear the IP and mask of an interface
    pub fn set_interface_ip(
        &mut self,
        interface_id: &str,
        ip_address: Option<String>,
        subnet_mask: Option<String>,
    ) -> Result<(), TopologyError> {
        let iface = self.find_interface_mut(interface_id).ok_or_else(|| TopologyError::UnknownInterface {
            interface_id: interface_id.to_string(),
        })?;
        iface.ip_address = ip_address;
        iface.subnet_mask = subnet_mask;
        Ok(())
    }

    pub fn set_interface_vlan(&mut self, interface_id: &str, vlan_id: Option<u16>) -> Result<(), TopologyError> {
        let iface = self.find_interface_mut(interface_id).ok_or_else(|| TopologyError::UnknownInterface {
            interface_id: interface_id.to_string(),
        })?;
        iface.vlan_id = vlan_id;
        Ok(())
    }

    pub fn set_default_gateway(&mut self, device_id: &str, gateway: Option<String>) -> Result<(), TopologyError> {
        self.device_mut_or_err(device_id)?.default_gateway = gateway;
        Ok(())
    }

    pub fn rename_device(&mut self, device_id: &str, name: impl Into<String>) -> Result<(), TopologyError> {
        self.device_mut_or_err(device_id)?.name = name.into();
        Ok(())
    }

    pub fn move_device(&mut self, device_id: &str, x: f32, y: f32) -> Result<(), TopologyError> {
        self.device_mut_or_err(device_id)?.position = super::types::Position::new(x, y);
        Ok(())
    }

    fn device_mut_or_err(&mut self, device_id: &str) -> Result<&mut Device, TopologyError> {
        self.find_device_mut(device_id).ok_or_else(|| TopologyError::UnknownDevice {
            device_id: device_id.to_string(),
        })
    }

    /// Next `link-N` id not already present
    pub(super) fn next_link_id(&mut self) -> String {
        loop {
            self.link_seq += 1;
            let candidate = format!("link-{}", self.link_seq);
            if self.find_link(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
