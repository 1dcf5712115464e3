//! Task and requirement schema.
//!
//! Tasks are authored as YAML. Each requirement is tagged by `kind`:
//!
//! ```yaml
//! id: lan-basics
//! title: Build a small LAN
//! requirements:
//!   - kind: device_count
//!     device_type: pc
//!     min: 2
//!   - kind: ping_successful
//!     from: PC-1
//!     to: PC-2
//!     error_message: PC-1 cannot reach PC-2
//! ```

use serde::{Deserialize, Serialize};

use crate::topology::DeviceKind;

/// A learning task: a titled list of requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// One checkable condition, with optional authored texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(flatten)]
    pub kind: RequirementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequirementKind {
    /// Number of devices of one kind lies in `min..=max`
    DeviceCount {
        device_type: DeviceKind,
        min: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Every pair of the named devices has a path
    DevicesConnected { device_names: Vec<String> },
    Connectivity { from: String, to: String },
    /// Every matching host has an IP, optionally starting with a prefix
    IpConfigured {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subnet_prefix: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_type: Option<DeviceKind>,
    },
    SubnetCount { count: usize },
    /// Reachability with an addressed destination. No packets are simulated.
    PingSuccessful { from: String, to: String },
    Vlan {
        vlan_id: u16,
        #[serde(default)]
        device_names: Vec<String>,
    },
    /// Named check from a fixed table
    Custom { checker_id: String },
}

impl Requirement {
    pub fn new(kind: RequirementKind) -> Self {
        Self {
            kind,
            description: None,
            error_message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_error_message(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = Some(error_message.into());
        self
    }

    /// Authored description, or one derived from the parameters
    pub fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        match &self.kind {
            RequirementKind::DeviceCount { device_type, min, max: Some(max) } => {
                format!("Between {} and {} {} device(s)", min, max, device_type)
            }
            RequirementKind::DeviceCount { device_type, min, max: None } => {
                format!("At least {} {} device(s)", min, device_type)
            }
            RequirementKind::DevicesConnected { device_names } => {
                format!("{} are connected", device_names.join(", "))
            }
            RequirementKind::Connectivity { from, to } => format!("{} is connected to {}", from, to),
            RequirementKind::IpConfigured { subnet_prefix, device_type } => {
                let scope = device_type.map(|k| k.to_string()).unwrap_or_else(|| "every host".to_string());
                match subnet_prefix {
                    Some(prefix) => format!("IP addresses in {}x configured on {}", prefix, scope),
                    None => format!("IP addresses configured on {}", scope),
                }
            }
            RequirementKind::SubnetCount { count } => format!("At least {} subnet(s)", count),
            RequirementKind::PingSuccessful { from, to } => format!("{} can ping {}", from, to),
            RequirementKind::Vlan { vlan_id, device_names } if device_names.is_empty() => {
                format!("VLAN {} is configured", vlan_id)
            }
            RequirementKind::Vlan { vlan_id, device_names } => {
                format!("{} are in VLAN {}", device_names.join(", "), vlan_id)
            }
            RequirementKind::Custom { checker_id } => format!("Check '{}' passes", checker_id),
        }
    }

    /// Authored error message, or a generic one for the requirement kind
    pub fn error_message(&self) -> String {
        if let Some(message) = &self.error_message {
            return message.clone();
        }
        let message = match &self.kind {
            RequirementKind::DeviceCount { .. } => "Too few or too many devices",
            RequirementKind::DevicesConnected { .. } | RequirementKind::Connectivity { .. } => {
                "Devices are not connected"
            }
            RequirementKind::IpConfigured { .. } => "Incorrect IP configuration",
            RequirementKind::SubnetCount { .. } => "Not enough subnets",
            RequirementKind::PingSuccessful { .. } => "Devices cannot exchange packets",
            RequirementKind::Vlan { .. } => "Incorrect VLAN configuration",
            RequirementKind::Custom { .. } => "Requirement not met",
        };
        message.to_string()
    }

    /// Hint derived from the requirement kind and its parameters
    pub fn hint(&self) -> String {
        match &self.kind {
            RequirementKind::DeviceCount { device_type, min, max } => match max {
                Some(max) => format!("Use between {} and {} {} device(s)", min, max, device_type),
                None => format!("Add at least {} {} device(s)", min, device_type),
            },
            RequirementKind::DevicesConnected { .. } => {
                "Make sure all listed devices are cabled together".to_string()
            }
            RequirementKind::Connectivity { from, to } => {
                format!("Connect {} and {} directly or through switches and routers", from, to)
            }
            RequirementKind::IpConfigured { subnet_prefix: Some(prefix), .. } => {
                format!("Configure IP addresses in the {}x subnet", prefix)
            }
            RequirementKind::IpConfigured { subnet_prefix: None, .. } => {
                "Configure an IP address on every host".to_string()
            }
            RequirementKind::SubnetCount { count } => format!("Create {} different subnets", count),
            RequirementKind::PingSuccessful { from, to } => {
                format!("Check addressing and cabling between {} and {}", from, to)
            }
            RequirementKind::Vlan { vlan_id, .. } => {
                format!("Assign VLAN {} to every interface of the listed devices", vlan_id)
            }
            RequirementKind::Custom { checker_id } => match checker_id.as_str() {
                "vlan_configured" => "Configure at least two different VLANs".to_string(),
                "gateway_configured" => "Set a default gateway on every PC and server".to_string(),
                "gateway_in_subnet" => "Each default gateway must be in the same subnet as its host".to_string(),
                "fully_connected" => "Cable every device into a single network".to_string(),
                _ => "Check the settings described in the task".to_string(),
            },
        }
    }
}

impl From<RequirementKind> for Requirement {
    fn from(kind: RequirementKind) -> Self {
        Self::new(kind)
    }
}
