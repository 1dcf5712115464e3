//! ARP broadcast and reply as a lazy event stream.
//!
//! The request reaches the source's immediate neighbors only. There is no
//! flooding through switches, so the broadcast domain is one cable deep.

use log::{debug, warn};

use super::events::{PacedQueue, SimulationEvent};
use super::packet::Packet;
use super::simulator::{source_endpoint, NetworkSimulator};

pub struct ArpSimulation<'s, 'a> {
    sim: &'s mut NetworkSimulator<'a>,
    queue: PacedQueue,
    request: Option<Packet>,
    source_id: String,
    target_ip: String,
    stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Broadcast,
    Reply,
    Finished,
}

impl<'s, 'a> ArpSimulation<'s, 'a> {
    pub(crate) fn new(sim: &'s mut NetworkSimulator<'a>, source_device_id: &str, target_ip: &str) -> Self {
        let mut queue = PacedQueue::default();
        let stage = match source_endpoint(sim.topology(), source_device_id) {
            Ok(_) => Stage::Broadcast,
            Err(message) => {
                warn!("ARP from {} cannot start: {}", source_device_id, message);
                queue.push(SimulationEvent::error(message));
                queue.push(SimulationEvent::SimulationEnded { success: false });
                Stage::Finished
            }
        };
        Self {
            sim,
            queue,
            request: None,
            source_id: source_device_id.to_string(),
            target_ip: target_ip.to_string(),
            stage,
        }
    }

    fn broadcast(&mut self) {
        let topology = self.sim.topology();
        let Ok(source) = source_endpoint(topology, &self.source_id) else {
            return;
        };

        let request = Packet::arp_request(
            self.sim.next_packet_id(),
            source.interface.mac_address(),
            source.ip,
            &self.target_ip,
        );
        self.queue.push(SimulationEvent::SimulationStarted);
        self.queue.push(SimulationEvent::log(format!("ARP: {}", request.payload)));
        self.queue.push(SimulationEvent::PacketCreated {
            packet: request.clone(),
            at_device_id: self.source_id.clone(),
        });
        for neighbor in topology.neighbors(&self.source_id) {
            self.queue.push(SimulationEvent::PacketInTransit {
                packet: request.clone(),
                from_device_id: self.source_id.clone(),
                to_device_id: neighbor.id().to_string(),
                progress: 1.0,
            });
        }
        self.queue.pause(self.sim.step_delay());
        self.request = Some(request);
    }

    fn reply(&mut self) {
        let topology = self.sim.topology();
        let (Some(request), Some(target)) = (&self.request, topology.find_device_by_ip(&self.target_ip)) else {
            self.queue.push(SimulationEvent::log(format!(
                "ARP: no reply for {}, host not found",
                self.target_ip
            )));
            self.queue.push(SimulationEvent::SimulationEnded { success: false });
            return;
        };
        let Some(target_iface) = target
            .interfaces()
            .iter()
            .find(|iface| iface.ip_address.as_deref() == Some(self.target_ip.as_str()))
        else {
            self.queue.push(SimulationEvent::SimulationEnded { success: false });
            return;
        };

        let reply = Packet::arp_reply(
            self.sim.next_packet_id(),
            target_iface.mac_address(),
            &request.source_mac,
            &self.target_ip,
            request.source_ip.as_deref().unwrap_or_default(),
        );
        self.queue.push(SimulationEvent::log(format!("ARP Reply: {}", reply.payload)));
        self.queue.push(SimulationEvent::PacketCreated {
            packet: reply.clone(),
            at_device_id: target.id().to_string(),
        });
        self.queue.push_paced(
            SimulationEvent::PacketInTransit {
                packet: reply.clone(),
                from_device_id: target.id().to_string(),
                to_device_id: self.source_id.clone(),
                progress: 1.0,
            },
            self.sim.step_delay(),
        );
        self.queue.push(SimulationEvent::PacketDelivered {
            packet: reply,
            at_device_id: self.source_id.clone(),
        });

        self.sim.learn(&self.source_id, &self.target_ip, target_iface.mac_address());
        debug!("ARP from {} resolved {} via {}", self.source_id, self.target_ip, target.id());
        self.queue.push(SimulationEvent::log(format!(
            "ARP: added {} -> {} to the table",
            self.target_ip,
            target_iface.mac_address()
        )));
        self.queue.push(SimulationEvent::SimulationEnded { success: true });
    }
}

impl Iterator for ArpSimulation<'_, '_> {
    type Item = SimulationEvent;

    fn next(&mut self) -> Option<SimulationEvent> {
        loop {
            if let Some(event) = self.queue.pop() {
                return Some(event);
            }
            match self.stage {
                Stage::Finished => return None,
                Stage::Broadcast => {
                    self.broadcast();
                    self.stage = Stage::Reply;
                }
                Stage::Reply => {
                    self.reply();
                    self.stage = Stage::Finished;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Device, Topology};
    use std::time::Duration;

    fn star() -> Topology {
        let mut topology = Topology::new("t", "Star");
        topology.add_device(Device::switch("sw1", "Switch-1")).unwrap();
        for (id, name, ip) in [
            ("pc1", "PC-1", "10.0.0.1"),
            ("pc2", "PC-2", "10.0.0.2"),
            ("pc3", "PC-3", "10.0.0.3"),
        ] {
            topology.add_device(Device::pc(id, name).with_ip(ip)).unwrap();
            topology.connect_devices(id, "sw1").unwrap();
        }
        topology
    }

    #[test]
    fn test_broadcast_reaches_immediate_neighbors_only() {
        let topology = star();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let transit: Vec<(String, String)> = sim
            .simulate_arp("pc1", "10.0.0.3")
            .filter_map(|e| match e {
                SimulationEvent::PacketInTransit { from_device_id, to_device_id, .. } => {
                    Some((from_device_id, to_device_id))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            transit,
            vec![
                ("pc1".to_string(), "sw1".to_string()),
                ("pc3".to_string(), "pc1".to_string()),
            ]
        );
    }

    #[test]
    fn test_reply_is_cached() {
        let topology = star();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_arp("pc1", "10.0.0.2").collect();
        assert_eq!(events.last(), Some(&SimulationEvent::SimulationEnded { success: true }));
        let mac = topology.find_interface("pc2:eth0").unwrap().mac_address();
        assert_eq!(sim.arp_table("pc1").get("10.0.0.2").map(String::as_str), Some(mac));
        assert_eq!(sim.topology_lookups(), 0);
    }

    #[test]
    fn test_unknown_target() {
        let topology = star();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_arp("pc1", "10.0.0.99").collect();
        assert_eq!(events[0], SimulationEvent::SimulationStarted);
        assert_eq!(events.last(), Some(&SimulationEvent::SimulationEnded { success: false }));
        assert!(sim.arp_table("pc1").is_empty());
    }

    #[test]
    fn test_source_without_ip() {
        let topology = star();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_arp("sw1", "10.0.0.2").collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SimulationEvent::Error { .. }));
    }
}
