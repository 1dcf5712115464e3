#[cfg(test)]
mod topology_tests {
    use netlab::ip::{are_in_same_subnet, get_subnet};
    use netlab::topology::{Device, DeviceKind, Topology, TopologyError};

    /// Two PCs and a router hanging off one switch
    fn office() -> Topology {
        let mut topology = Topology::new("office", "Office");
        topology.add_device(Device::switch("sw1", "Switch-1")).unwrap();
        topology.add_device(Device::router("r1", "Router-1").with_ip("192.168.1.1")).unwrap();
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("192.168.1.10")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("192.168.1.20")).unwrap();
        for id in ["r1", "pc1", "pc2"] {
            topology.connect_devices(id, "sw1").unwrap();
        }
        topology
    }

    #[test]
    fn test_connect_disconnect_round_trip() {
        let mut topology = Topology::new("t", "Round trip");
        topology.add_device(Device::pc("pc1", "PC-1")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2")).unwrap();
        let before = topology.clone();

        let link_id = topology.connect("pc1:eth0", "pc2:eth0").unwrap();
        assert!(topology.find_interface("pc1:eth0").unwrap().is_connected());

        let link = topology.disconnect(&link_id).unwrap();
        assert_eq!(link.id, link_id);
        assert!(topology.links().is_empty());
        assert_eq!(topology.find_interface("pc1:eth0").unwrap().peer_interface_id(), None);
        assert_eq!(topology.find_interface("pc2:eth0").unwrap().peer_interface_id(), None);
        assert_eq!(topology.devices(), before.devices());
    }

    #[test]
    fn test_device_removal_cascades() {
        let mut topology = office();
        assert_eq!(topology.links().len(), 3);

        let removed = topology.remove_device("sw1").unwrap();
        assert_eq!(removed.kind(), DeviceKind::Switch);
        assert!(topology.links().is_empty());
        for id in ["r1:eth0", "pc1:eth0", "pc2:eth0"] {
            assert!(!topology.find_interface(id).unwrap().is_connected(), "{} still has a peer", id);
        }
        assert!(topology.remove_device("sw1").is_none());
    }

    #[test]
    fn test_removing_leaf_keeps_other_links() {
        let mut topology = office();
        topology.remove_device("pc1");
        assert_eq!(topology.links().len(), 2);
        assert!(topology
            .links()
            .iter()
            .all(|link| !link.interface_a_id.starts_with("pc1:") && !link.interface_b_id.starts_with("pc1:")));
        assert_eq!(topology.neighbor_ids("sw1"), vec!["r1", "pc2"]);
        topology.verify_integrity().unwrap();
    }

    #[test]
    fn test_duplicate_device_id_rejected() {
        let mut topology = office();
        let err = topology.add_device(Device::pc("pc1", "Another PC")).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateId { id } if id == "pc1"));
        assert_eq!(topology.devices().len(), 4);
    }

    #[test]
    fn test_lookups() {
        let topology = office();
        assert_eq!(topology.find_device_by_ip("192.168.1.20").map(|d| d.id()), Some("pc2"));
        assert_eq!(topology.find_device_by_name("pc-1").map(|d| d.id()), Some("pc1"));
        assert!(topology.find_device_by_ip("10.0.0.1").is_none());
        assert_eq!(topology.device_count_by_kind(DeviceKind::Pc), 2);
        assert_eq!(topology.subnets().into_iter().collect::<Vec<_>>(), vec!["192.168.1.0"]);
    }

    #[test]
    fn test_subnet_arithmetic() {
        assert_eq!(get_subnet("192.168.1.100", "255.255.255.0"), "192.168.1.0");
        assert!(!are_in_same_subnet("192.168.1.10", "192.168.2.10", "255.255.255.0"));
        assert!(are_in_same_subnet("192.168.1.10", "192.168.1.20", "255.255.255.0"));
        assert!(!are_in_same_subnet("192.168.1", "192.168.1.20", "255.255.255.0"));
    }

    #[test]
    fn test_snapshot_survives_json() {
        let topology = office();
        let json = topology.to_json().unwrap();
        let decoded = Topology::from_json(&json).unwrap();
        assert_eq!(decoded.devices(), topology.devices());
        assert_eq!(decoded.links(), topology.links());
    }
}
