//! Simulated packets.

use serde::{Deserialize, Serialize};

/// Destination MAC of an ARP request
pub const BROADCAST_MAC: &str = "ff:ff:ff:ff:ff:ff";

/// Kind of simulated packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    IcmpEchoRequest,
    IcmpEchoReply,
    ArpRequest,
    ArpReply,
}

impl std::fmt::Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PacketKind::IcmpEchoRequest => "ICMP Echo Request",
            PacketKind::IcmpEchoReply => "ICMP Echo Reply",
            PacketKind::ArpRequest => "ARP Request",
            PacketKind::ArpReply => "ARP Reply",
        };
        f.write_str(label)
    }
}

/// A packet as seen by the animation layer. There is no byte-level framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub id: String,
    pub kind: PacketKind,
    pub source_mac: String,
    pub destination_mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
    #[serde(default)]
    pub payload: String,
}

impl Packet {
    /// ICMP Echo Request for one ping sequence number
    pub fn echo_request(
        id: String,
        source_mac: &str,
        destination_mac: &str,
        source_ip: &str,
        destination_ip: &str,
        sequence_number: u32,
    ) -> Self {
        Self {
            id,
            kind: PacketKind::IcmpEchoRequest,
            source_mac: source_mac.to_string(),
            destination_mac: destination_mac.to_string(),
            source_ip: Some(source_ip.to_string()),
            destination_ip: Some(destination_ip.to_string()),
            sequence_number: Some(sequence_number),
            payload: "ICMP Echo Request".to_string(),
        }
    }

    /// Broadcast "who has" request
    pub fn arp_request(id: String, source_mac: &str, source_ip: &str, target_ip: &str) -> Self {
        Self {
            id,
            kind: PacketKind::ArpRequest,
            source_mac: source_mac.to_string(),
            destination_mac: BROADCAST_MAC.to_string(),
            source_ip: Some(source_ip.to_string()),
            destination_ip: Some(target_ip.to_string()),
            sequence_number: None,
            payload: format!("Who has {}? Tell {}", target_ip, source_ip),
        }
    }

    /// Unicast "is at" answer to an ARP request
    pub fn arp_reply(id: String, source_mac: &str, destination_mac: &str, source_ip: &str, destination_ip: &str) -> Self {
        Self {
            id,
            kind: PacketKind::ArpReply,
            source_mac: source_mac.to_string(),
            destination_mac: destination_mac.to_string(),
            source_ip: Some(source_ip.to_string()),
            destination_ip: Some(destination_ip.to_string()),
            sequence_number: None,
            payload: format!("{} is at {}", source_ip, source_mac),
        }
    }

    /// Reply with source and destination swapped and the same sequence number
    pub fn reply(&self, id: String, kind: PacketKind) -> Self {
        let payload = match kind {
            PacketKind::IcmpEchoReply => "ICMP Echo Reply".to_string(),
            _ => self.payload.clone(),
        };
        Self {
            id,
            kind,
            source_mac: self.destination_mac.clone(),
            destination_mac: self.source_mac.clone(),
            source_ip: self.destination_ip.clone(),
            destination_ip: self.source_ip.clone(),
            sequence_number: self.sequence_number,
            payload,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination_mac.eq_ignore_ascii_case(BROADCAST_MAC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_reply_swaps_endpoints() {
        let request = Packet::echo_request(
            "pkt-1".to_string(),
            "02:00:00:00:00:01",
            "02:00:00:00:00:02",
            "192.168.1.10",
            "192.168.1.20",
            3,
        );
        let reply = request.reply("pkt-2".to_string(), PacketKind::IcmpEchoReply);
        assert_eq!(reply.kind, PacketKind::IcmpEchoReply);
        assert_eq!(reply.source_mac, "02:00:00:00:00:02");
        assert_eq!(reply.destination_ip.as_deref(), Some("192.168.1.10"));
        assert_eq!(reply.sequence_number, Some(3));
    }

    #[test]
    fn test_arp_request_is_broadcast() {
        let request = Packet::arp_request("pkt-1".to_string(), "02:00:00:00:00:01", "10.0.0.1", "10.0.0.2");
        assert!(request.is_broadcast());
        assert_eq!(request.payload, "Who has 10.0.0.2? Tell 10.0.0.1");
    }
}
