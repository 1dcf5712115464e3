//! ICMP echo exchange as a lazy event stream.

use std::time::Duration;

use log::{debug, warn};

use super::events::{PacedQueue, SimulationEvent};
use super::packet::{Packet, PacketKind};
use super::simulator::{source_endpoint, NetworkSimulator};

/// Event stream of one ping run.
///
/// Events for a sequence number are only computed once the consumer has
/// drained the previous one, so ARP lookups and cache updates happen as the
/// stream is pulled. Dropping the iterator stops the run.
pub struct PingSimulation<'s, 'a> {
    sim: &'s mut NetworkSimulator<'a>,
    queue: PacedQueue,
    route: Option<Route>,
    stage: Stage,
    count: u32,
    received: u32,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Start,
    Sequence(u32),
    Summary,
    Finished,
}

struct Route {
    source_id: String,
    source_name: String,
    source_ip: String,
    source_mac: String,
    destination_id: String,
    destination_name: String,
    destination_ip: String,
}

impl<'s, 'a> PingSimulation<'s, 'a> {
    pub(crate) fn new(sim: &'s mut NetworkSimulator<'a>, source_device_id: &str, destination_ip: &str, count: u32) -> Self {
        let mut queue = PacedQueue::default();
        let route = match Route::resolve(sim, source_device_id, destination_ip) {
            Ok(route) => Some(route),
            Err(message) => {
                warn!("Ping from {} to {} cannot start: {}", source_device_id, destination_ip, message);
                queue.push(SimulationEvent::error(message));
                queue.push(SimulationEvent::SimulationEnded { success: false });
                None
            }
        };
        let stage = if route.is_some() { Stage::Start } else { Stage::Finished };
        Self {
            sim,
            queue,
            route,
            stage,
            count,
            received: 0,
        }
    }

    /// Queue the events of one sequence number; true if the reply came back
    fn run_sequence(&mut self, seq: u32) -> bool {
        let Some(route) = &self.route else {
            return false;
        };
        let step = self.sim.step_delay();
        let queue = &mut self.queue;

        queue.push(SimulationEvent::log(format!("--- packet {} of {} ---", seq, self.count)));

        let destination_mac = match self.sim.resolve_arp_traced(&route.source_id, &route.destination_ip) {
            Some((mac, cached)) => {
                let note = if cached { " (cached)" } else { "" };
                queue.push_paced(
                    SimulationEvent::log(format!("ARP: {} is at {}{}", route.destination_ip, mac, note)),
                    step / 2,
                );
                mac
            }
            None => {
                queue.push(SimulationEvent::log(format!(
                    "ARP: no MAC address found for {}, packet {} lost",
                    route.destination_ip, seq
                )));
                return false;
            }
        };

        let request = Packet::echo_request(
            self.sim.next_packet_id(),
            &route.source_mac,
            &destination_mac,
            &route.source_ip,
            &route.destination_ip,
            seq,
        );
        queue.push(SimulationEvent::PacketCreated {
            packet: request.clone(),
            at_device_id: route.source_id.clone(),
        });
        queue.push(SimulationEvent::log(format!(
            "ICMP: {} sends Echo Request seq={}",
            route.source_name, seq
        )));

        let path = self.sim.find_path(&route.source_id, &route.destination_id);
        if path.is_empty() {
            queue.push(SimulationEvent::PacketDropped {
                packet: request,
                reason: format!("no route to {}", route.destination_ip),
            });
            queue.push(SimulationEvent::error(format!(
                "Destination host {} unreachable: no path from {} to {}",
                route.destination_ip, route.source_name, route.destination_name
            )));
            return false;
        }

        push_transit(queue, &request, path.iter(), path.len() - 1, step);
        queue.push(SimulationEvent::PacketDelivered {
            packet: request.clone(),
            at_device_id: route.destination_id.clone(),
        });
        queue.push_paced(
            SimulationEvent::log(format!("ICMP: Echo Request seq={} delivered to {}", seq, route.destination_name)),
            step / 2,
        );

        let reply = request.reply(self.sim.next_packet_id(), PacketKind::IcmpEchoReply);
        queue.push(SimulationEvent::PacketCreated {
            packet: reply.clone(),
            at_device_id: route.destination_id.clone(),
        });
        queue.push(SimulationEvent::log(format!(
            "ICMP: {} sends Echo Reply seq={}",
            route.destination_name, seq
        )));
        push_transit(queue, &reply, path.iter().rev(), path.len() - 1, step);
        queue.push(SimulationEvent::PacketDelivered {
            packet: reply,
            at_device_id: route.source_id.clone(),
        });

        let rtt = (path.len() - 1) * 2 * 10;
        queue.push(SimulationEvent::log(format!(
            "Reply from {}: seq={} time={}ms",
            route.destination_ip, seq, rtt
        )));
        true
    }

    fn push_summary(&mut self) {
        let Some(route) = &self.route else {
            return;
        };
        let lost = self.count - self.received;
        debug!(
            "Ping {} -> {} finished: {}/{} replies",
            route.source_id, route.destination_ip, self.received, self.count
        );
        self.queue
            .push(SimulationEvent::log(format!("--- {} ping statistics ---", route.destination_ip)));
        self.queue.push(SimulationEvent::log(format!(
            "{} packets transmitted, {} received, {} lost",
            self.count, self.received, lost
        )));
        self.queue.push(SimulationEvent::SimulationEnded { success: lost == 0 });
    }
}

impl Route {
    fn resolve(sim: &NetworkSimulator<'_>, source_device_id: &str, destination_ip: &str) -> Result<Self, String> {
        let topology = sim.topology();
        let source = source_endpoint(topology, source_device_id)?;
        let destination = topology
            .find_device_by_ip(destination_ip)
            .ok_or_else(|| format!("Host {} unreachable: no device has this address", destination_ip))?;
        Ok(Self {
            source_id: source.device.id().to_string(),
            source_name: source.device.name.clone(),
            source_ip: source.ip.to_string(),
            source_mac: source.interface.mac_address().to_string(),
            destination_id: destination.id().to_string(),
            destination_name: destination.name.clone(),
            destination_ip: destination_ip.to_string(),
        })
    }
}

/// One `PacketInTransit` per hop along `path`, each followed by `step`
fn push_transit<'p>(
    queue: &mut PacedQueue,
    packet: &Packet,
    path: impl Iterator<Item = &'p String> + Clone,
    hops: usize,
    step: Duration,
) {
    for (i, (from, to)) in path.clone().zip(path.skip(1)).enumerate() {
        queue.push_paced(
            SimulationEvent::PacketInTransit {
                packet: packet.clone(),
                from_device_id: from.clone(),
                to_device_id: to.clone(),
                progress: (i + 1) as f32 / hops as f32,
            },
            step,
        );
    }
}

impl Iterator for PingSimulation<'_, '_> {
    type Item = SimulationEvent;

    fn next(&mut self) -> Option<SimulationEvent> {
        loop {
            if let Some(event) = self.queue.pop() {
                return Some(event);
            }

            match self.stage {
                Stage::Finished => return None,
                Stage::Start => {
                    if let Some(route) = &self.route {
                        self.queue.push(SimulationEvent::SimulationStarted);
                        self.queue.push(SimulationEvent::log(format!(
                            "PING {} from {}",
                            route.destination_ip, route.source_ip
                        )));
                    }
                    self.stage = if self.count == 0 { Stage::Summary } else { Stage::Sequence(1) };
                }
                Stage::Sequence(seq) => {
                    if self.run_sequence(seq) {
                        self.received += 1;
                    }
                    if seq < self.count {
                        self.queue.pause(self.sim.step_delay());
                        self.stage = Stage::Sequence(seq + 1);
                    } else {
                        self.stage = Stage::Summary;
                    }
                }
                Stage::Summary => {
                    self.push_summary();
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

    fn lan() -> Topology {
        let mut topology = Topology::new("t", "LAN");
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10")).unwrap();
        topology.add_device(Device::switch("sw1", "Switch-1")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.1.20")).unwrap();
        topology.connect_devices("pc1", "sw1").unwrap();
        topology.connect_devices("pc2", "sw1").unwrap();
        topology
    }

    #[test]
    fn test_unknown_destination_ends_immediately() {
        let topology = lan();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_ping("pc1", "10.9.9.9", 3).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SimulationEvent::Error { .. }));
        assert_eq!(events[1], SimulationEvent::SimulationEnded { success: false });
    }

    #[test]
    fn test_source_without_ip() {
        let topology = lan();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_ping("sw1", "192.168.1.20", 1).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SimulationEvent::Error { message } if message.contains("Switch-1")));
    }

    #[test]
    fn test_transit_progress() {
        let topology = lan();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let progress: Vec<f32> = sim
            .simulate_ping("pc1", "192.168.1.20", 1)
            .filter_map(|e| match e {
                SimulationEvent::PacketInTransit { progress, .. } => Some(progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0.5, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_second_sequence_uses_cache() {
        let topology = lan();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let logs: Vec<String> = sim
            .simulate_ping("pc1", "192.168.1.20", 2)
            .filter_map(|e| match e {
                SimulationEvent::Log { message } if message.starts_with("ARP:") => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(logs.len(), 2);
        assert!(!logs[0].ends_with("(cached)"));
        assert!(logs[1].ends_with("(cached)"));
        assert_eq!(sim.topology_lookups(), 1);
    }

    #[test]
    fn test_zero_count() {
        let topology = lan();
        let mut sim = NetworkSimulator::with_step_delay(&topology, Duration::ZERO);
        let events: Vec<_> = sim.simulate_ping("pc1", "192.168.1.20", 0).collect();
        assert_eq!(events.first(), Some(&SimulationEvent::SimulationStarted));
        assert_eq!(events.last(), Some(&SimulationEvent::SimulationEnded { success: true }));
        assert!(!events.iter().any(|e| matches!(e, SimulationEvent::PacketCreated { .. })));
    }
}
