//! Scoring a topology on its own and against a task.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use super::requirements::{Requirement, RequirementKind, Task};
use super::result::{ValidationError, ValidationResult};
use crate::ip::{are_in_same_subnet, is_valid_ipv4};
use crate::simulation::{connected_components, find_path};
use crate::topology::{Device, Topology};

/// Named checks available to `custom` requirements
pub const CUSTOM_CHECKS: &[(&str, fn(&Topology) -> bool)] = &[
    ("vlan_configured", vlan_configured),
    ("gateway_configured", gateway_configured),
    ("gateway_in_subnet", gateway_in_subnet),
    ("fully_connected", fully_connected),
];

/// Look up a custom check by id
pub fn custom_check(checker_id: &str) -> Option<fn(&Topology) -> bool> {
    CUSTOM_CHECKS
        .iter()
        .find(|(id, _)| *id == checker_id)
        .map(|(_, check)| *check)
}

/// Structural sanity checks that apply to any topology
///
/// Checks for:
/// - An empty topology (fatal, nothing else is checked)
/// - Hosts and routers without an IP address (warning)
/// - The same IP on two interfaces (error)
/// - A network split into several segments (warning)
/// - Malformed IP addresses (error)
pub fn validate_basic(topology: &Topology) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if topology.is_empty() {
        errors.push(ValidationError::error(
            "The network is empty",
            Some("Add at least one device".to_string()),
        ));
        return ValidationResult {
            is_valid: false,
            score: 0,
            errors,
            ..Default::default()
        };
    }

    for device in topology.devices() {
        if !device.is_layer2() && device.primary_ip().is_none() {
            warnings.push(format!("{} has no IP address", device.name));
        }
    }

    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (device, ip) in configured_ips(topology) {
        match owners.get(ip) {
            Some(first) => errors.push(ValidationError::error(
                format!("Duplicate IP address {} on {} and {}", ip, first, device.name),
                Some(format!("IP address {} is used by both {} and {}", ip, first, device.name)),
            )),
            None => {
                owners.insert(ip, &device.name);
            }
        }
    }

    let segments = connected_components(topology).len();
    if segments > 1 {
        warnings.push(format!("The network is split into {} separate segments", segments));
    }

    for (_, ip) in configured_ips(topology) {
        if !is_valid_ipv4(ip) {
            errors.push(ValidationError::error(
                format!("Invalid IP address: {}", ip),
                Some("Use the x.x.x.x format with every x between 0 and 255".to_string()),
            ));
        }
    }

    let is_valid = errors.is_empty();
    let score = if is_valid {
        100u32.saturating_sub(10 * warnings.len() as u32)
    } else {
        0
    };
    info!(
        "Basic validation of '{}': score {}, {} error(s), {} warning(s)",
        topology.name,
        score,
        errors.len(),
        warnings.len()
    );

    ValidationResult {
        is_valid,
        score,
        errors,
        warnings,
        ..Default::default()
    }
}

fn configured_ips(topology: &Topology) -> impl Iterator<Item = (&Device, &str)> {
    topology.devices().iter().flat_map(|device| {
        device
            .interfaces()
            .iter()
            .filter_map(move |iface| iface.ip_address.as_deref().map(|ip| (device, ip)))
    })
}

/// Check a topology against every requirement of a task.
///
/// Basic validation runs first and its findings are merged in. Every
/// requirement is evaluated, so all failures are reported together.
pub fn validate_task(topology: &Topology, task: &Task) -> ValidationResult {
    let basic = validate_basic(topology);
    let mut errors = basic.errors.clone();
    let mut completed = Vec::new();
    let mut failed = Vec::new();

    for requirement in &task.requirements {
        let description = requirement.description();
        if requirement_met(topology, requirement) {
            debug!("Requirement passed: {}", description);
            completed.push(description);
        } else {
            debug!("Requirement failed: {}", description);
            errors.push(ValidationError::error(failure_message(requirement), Some(requirement.hint())));
            failed.push(description);
        }
    }

    let total = task.requirements.len();
    let score = if total > 0 {
        (completed.len() * 100 / total) as u32
    } else {
        basic.score
    };
    let is_valid = failed.is_empty() && !basic.has_errors();
    info!(
        "Task '{}': {}/{} requirement(s) met, score {}",
        task.id,
        completed.len(),
        total,
        score
    );

    ValidationResult {
        is_valid,
        score,
        errors,
        warnings: basic.warnings,
        completed_requirements: completed,
        failed_requirements: failed,
    }
}

fn failure_message(requirement: &Requirement) -> String {
    match &requirement.kind {
        RequirementKind::Custom { checker_id } if custom_check(checker_id).is_none() => {
            format!("Unknown checker '{}'", checker_id)
        }
        _ => requirement.error_message(),
    }
}

/// Evaluate one requirement
pub fn requirement_met(topology: &Topology, requirement: &Requirement) -> bool {
    match &requirement.kind {
        RequirementKind::DeviceCount { device_type, min, max } => {
            let count = topology.device_count_by_kind(*device_type);
            count >= *min && max.map_or(true, |max| count <= max)
        }

        RequirementKind::DevicesConnected { device_names } => {
            let Some(devices) = resolve_all(topology, device_names) else {
                return false;
            };
            if devices.len() < 2 {
                return true;
            }
            devices.iter().enumerate().all(|(i, a)| {
                devices[i + 1..]
                    .iter()
                    .all(|b| can_communicate(topology, a.id(), b.id()))
            })
        }

        RequirementKind::Connectivity { from, to } => {
            match (topology.find_device_by_name(from), topology.find_device_by_name(to)) {
                (Some(a), Some(b)) => can_communicate(topology, a.id(), b.id()),
                _ => false,
            }
        }

        RequirementKind::IpConfigured { subnet_prefix, device_type } => topology
            .devices()
            .iter()
            .filter(|d| !d.is_layer2())
            .filter(|d| device_type.map_or(true, |kind| d.kind() == kind))
            .all(|d| match (d.primary_ip(), subnet_prefix) {
                (Some(ip), Some(prefix)) => ip.starts_with(prefix.as_str()),
                (Some(_), None) => true,
                (None, _) => false,
            }),

        RequirementKind::SubnetCount { count } => topology.subnets().len() >= *count,

        RequirementKind::PingSuccessful { from, to } => {
            match (topology.find_device_by_name(from), topology.find_device_by_name(to)) {
                (Some(a), Some(b)) => b.primary_ip().is_some() && can_communicate(topology, a.id(), b.id()),
                _ => false,
            }
        }

        RequirementKind::Vlan { vlan_id, device_names } => {
            if device_names.is_empty() {
                return topology
                    .devices()
                    .iter()
                    .flat_map(|d| d.interfaces())
                    .any(|iface| iface.vlan_id == Some(*vlan_id));
            }
            let Some(devices) = resolve_all(topology, device_names) else {
                return false;
            };
            devices
                .iter()
                .flat_map(|d| d.interfaces())
                .all(|iface| iface.vlan_id == Some(*vlan_id))
        }

        RequirementKind::Custom { checker_id } => match custom_check(checker_id) {
            Some(check) => check(topology),
            None => {
                warn!("Unknown custom checker '{}'", checker_id);
                false
            }
        },
    }
}

/// Resolve every name, or `None` if any is unknown
fn resolve_all<'t>(topology: &'t Topology, names: &[String]) -> Option<Vec<&'t Device>> {
    let mut devices: Vec<&Device> = Vec::new();
    for name in names {
        let device = topology.find_device_by_name(name)?;
        if !devices.iter().any(|d| d.id() == device.id()) {
            devices.push(device);
        }
    }
    Some(devices)
}

/// Returns true if a chain of links joins the two devices
pub fn can_communicate(topology: &Topology, device_a_id: &str, device_b_id: &str) -> bool {
    !find_path(topology, device_a_id, device_b_id).is_empty()
}

fn vlan_configured(topology: &Topology) -> bool {
    let vlans: BTreeSet<u16> = topology
        .devices()
        .iter()
        .flat_map(|d| d.interfaces())
        .filter_map(|iface| iface.vlan_id)
        .collect();
    vlans.len() >= 2
}

fn gateway_configured(topology: &Topology) -> bool {
    end_hosts(topology).all(|d| d.default_gateway.is_some())
}

fn gateway_in_subnet(topology: &Topology) -> bool {
    end_hosts(topology).all(|d| {
        match (d.primary_interface(), d.default_gateway.as_deref()) {
            (Some(iface), Some(gateway)) => iface
                .ip_address
                .as_deref()
                .is_some_and(|ip| are_in_same_subnet(ip, gateway, iface.effective_mask())),
            _ => false,
        }
    })
}

fn fully_connected(topology: &Topology) -> bool {
    connected_components(topology).len() <= 1
}

fn end_hosts(topology: &Topology) -> impl Iterator<Item = &Device> {
    topology.devices().iter().filter(|d| d.kind().is_end_host())
}
