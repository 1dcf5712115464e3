//! Device, interface and link definitions.
//!
//! Interfaces reference their peer by id only; every dereference goes
//! through [`Topology`](super::Topology) lookups so the graph carries no
//! ownership cycles and serializes as plain data.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of network device a learner can place on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// End host (workstation)
    Pc,
    /// End host offering a service
    Server,
    /// Layer-2 switch
    Switch,
    /// Layer-3 router
    Router,
    /// Layer-2 repeater hub
    Hub,
}

impl DeviceKind {
    /// All kinds, in canvas palette order
    pub const ALL: [DeviceKind; 5] = [Self::Pc, Self::Server, Self::Switch, Self::Router, Self::Hub];

    /// Fixed number of interfaces a device of this kind is created with
    pub fn port_count(self) -> usize {
        match self {
            Self::Pc | Self::Server => 1,
            Self::Router | Self::Hub => 4,
            Self::Switch => 8,
        }
    }

    /// Interface name prefix (`eth0`, `port3`, ...)
    pub fn port_prefix(self) -> &'static str {
        match self {
            Self::Pc | Self::Server | Self::Router => "eth",
            Self::Switch | Self::Hub => "port",
        }
    }

    /// Returns true for devices that forward frames without IP awareness
    pub fn is_layer2(self) -> bool {
        matches!(self, Self::Switch | Self::Hub)
    }

    /// Returns true for PCs and servers
    pub fn is_end_host(self) -> bool {
        matches!(self, Self::Pc | Self::Server)
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeviceKind::Pc => "PC",
            DeviceKind::Server => "Server",
            DeviceKind::Switch => "Switch",
            DeviceKind::Router => "Router",
            DeviceKind::Hub => "Hub",
        };
        f.write_str(label)
    }
}

/// Canvas coordinates of a device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A network interface owned by exactly one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    id: String,
    pub name: String,
    owner_device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_mask: Option<String>,
    mac_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    peer_interface_id: Option<String>,
}

impl Interface {
    fn create(device_id: &str, name: String, mac_address: String) -> Self {
        Self {
            id: interface_id(device_id, &name),
            name,
            owner_device_id: device_id.to_string(),
            ip_address: None,
            subnet_mask: None,
            mac_address,
            vlan_id: None,
            peer_interface_id: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_device_id(&self) -> &str {
        &self.owner_device_id
    }

    /// Hardware address, fixed at creation
    pub fn mac_address(&self) -> &str {
        &self.mac_address
    }

    pub fn peer_interface_id(&self) -> Option<&str> {
        self.peer_interface_id.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.peer_interface_id.is_some()
    }

    /// Mask in effect for this interface, falling back to /24
    pub fn effective_mask(&self) -> &str {
        self.subnet_mask.as_deref().unwrap_or(crate::ip::DEFAULT_SUBNET_MASK)
    }

    /// `ip/prefix` notation, when an IP is set and the mask is contiguous
    pub fn cidr(&self) -> Option<String> {
        let ip = self.ip_address.as_deref()?;
        let prefix = crate::ip::prefix_length(self.effective_mask())?;
        Some(format!("{}/{}", ip, prefix))
    }

    pub(crate) fn set_peer(&mut self, peer: Option<String>) {
        self.peer_interface_id = peer;
    }

    /// Copy of this interface re-homed onto another device id
    pub(crate) fn rehomed(&self, device_id: &str, peer: Option<String>) -> Self {
        Self {
            id: interface_id(device_id, &self.name),
            owner_device_id: device_id.to_string(),
            peer_interface_id: peer,
            ..self.clone()
        }
    }
}

/// Interface ids are scoped by their owning device
pub fn interface_id(device_id: &str, interface_name: &str) -> String {
    format!("{}:{}", device_id, interface_name)
}

/// A device on the canvas. Its interface list is sized by kind and never resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    id: String,
    kind: DeviceKind,
    pub name: String,
    #[serde(default)]
    pub position: Position,
    interfaces: Vec<Interface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gateway: Option<String>,
}

impl Device {
    /// Create a device with freshly generated MAC addresses
    pub fn new(kind: DeviceKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_rng(kind, id, name, &mut rand::thread_rng())
    }

    /// Create a device drawing MAC addresses from the given generator
    pub fn with_rng<R: Rng + ?Sized>(
        kind: DeviceKind,
        id: impl Into<String>,
        name: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        let id = id.into();
        let interfaces = (0..kind.port_count())
            .map(|i| Interface::create(&id, format!("{}{}", kind.port_prefix(), i), generate_mac(rng)))
            .collect();
        Self {
            id,
            kind,
            name: name.into(),
            position: Position::default(),
            interfaces,
            default_gateway: None,
        }
    }

    pub fn pc(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeviceKind::Pc, id, name)
    }

    pub fn server(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeviceKind::Server, id, name)
    }

    pub fn switch(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeviceKind::Switch, id, name)
    }

    pub fn router(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeviceKind::Router, id, name)
    }

    pub fn hub(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(DeviceKind::Hub, id, name)
    }

    /// Builder: place the device on the canvas
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Builder: configure the first interface with `ip` and a /24 mask
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        if let Some(first) = self.interfaces.first_mut() {
            first.ip_address = Some(ip.into());
            first.subnet_mask = Some(crate::ip::DEFAULT_SUBNET_MASK.to_string());
        }
        self
    }

    /// Builder: set the default gateway
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.default_gateway = Some(gateway.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Mutable access to the interfaces. The slice cannot grow, and MAC and
    /// peer fields stay private to the topology.
    pub fn interfaces_mut(&mut self) -> &mut [Interface] {
        &mut self.interfaces
    }

    pub fn interface(&self, interface_id: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.id == interface_id)
    }

    pub(crate) fn interface_mut(&mut self, interface_id: &str) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|iface| iface.id == interface_id)
    }

    /// First interface with an IP address configured
    pub fn primary_interface(&self) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.ip_address.is_some())
    }

    /// IP address of the primary interface
    pub fn primary_ip(&self) -> Option<&str> {
        self.primary_interface().and_then(|iface| iface.ip_address.as_deref())
    }

    /// First interface without a peer
    pub fn free_interface(&self) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| !iface.is_connected())
    }

    pub fn is_layer2(&self) -> bool {
        self.kind.is_layer2()
    }

    pub fn is_router(&self) -> bool {
        self.kind == DeviceKind::Router
    }

    /// Returns true if any interface holds `ip`
    pub fn has_ip(&self, ip: &str) -> bool {
        self.interfaces.iter().any(|iface| iface.ip_address.as_deref() == Some(ip))
    }

    /// Describes why the interface list does not fit this device, if it doesn't.
    /// The list must hold exactly `port_count` interfaces with distinct names.
    pub(crate) fn shape_problem(&self) -> Option<String> {
        if self.interfaces.len() != self.kind.port_count() {
            return Some(format!(
                "{} has {} interface(s), expected {}",
                self.kind,
                self.interfaces.len(),
                self.kind.port_count()
            ));
        }
        let mut names = HashSet::new();
        self.interfaces
            .iter()
            .find(|iface| !names.insert(iface.name.as_str()))
            .map(|iface| format!("interface name '{}' is used twice", iface.name))
    }

    /// Copy of this device under a new id, with interface ids and peers remapped
    pub(crate) fn rehomed(&self, new_id: &str, remap_peer: impl Fn(&str) -> Option<String>) -> Self {
        let interfaces = self
            .interfaces
            .iter()
            .map(|iface| iface.rehomed(new_id, iface.peer_interface_id().and_then(&remap_peer)))
            .collect();
        Self {
            id: new_id.to_string(),
            interfaces,
            ..self.clone()
        }
    }
}

/// A cable between two interfaces on different devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub interface_a_id: String,
    pub interface_b_id: String,
}

impl Link {
    /// Returns true if either end is `interface_id`
    pub fn touches(&self, interface_id: &str) -> bool {
        self.interface_a_id == interface_id || self.interface_b_id == interface_id
    }

    /// The opposite end of the link from `interface_id`
    pub fn other_end(&self, interface_id: &str) -> Option<&str> {
        if self.interface_a_id == interface_id {
            Some(&self.interface_b_id)
        } else if self.interface_b_id == interface_id {
            Some(&self.interface_a_id)
        } else {
            None
        }
    }
}

/// Generate a unicast, locally administered MAC address
pub fn generate_mac<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 6];
    rng.fill_bytes(&mut bytes);
    bytes[0] = (bytes[0] & 0xfe) | 0x02;
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(":")
}
