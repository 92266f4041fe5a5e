//! Collaborators the ARP core leans on but does not own: the router's table of interfaces, and
//! the primitive that puts a frame on the wire.
use route_rs_packets::{MacAddr, Packet};
use std::collections::HashMap;
use std::net::Ipv4Addr;

mod transmit;
pub use self::transmit::*;

/// One of the router's own interfaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

impl Interface {
    pub fn new(name: &str, mac: MacAddr, ip: Ipv4Addr) -> Self {
        Interface {
            name: name.to_string(),
            mac,
            ip,
        }
    }
}

/// Source of the router's interface identities. Used to answer requests for our own addresses
/// and to fill in the sender fields of the requests and replies we send.
pub trait InterfaceTable {
    fn lookup_by_ip(&self, ip: Ipv4Addr) -> Option<Interface>;

    fn all(&self) -> Vec<Interface>;

    fn lookup_by_name(&self, name: &str) -> Option<Interface> {
        self.all().into_iter().find(|interface| interface.name == name)
    }
}

/// InterfaceTable backed by a map from interface name, fixed at construction.
#[derive(Clone, Debug, Default)]
pub struct StaticInterfaceTable {
    interfaces: HashMap<String, Interface>,
}

impl StaticInterfaceTable {
    pub fn new(interfaces: Vec<Interface>) -> Self {
        StaticInterfaceTable {
            interfaces: interfaces
                .into_iter()
                .map(|interface| (interface.name.clone(), interface))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl From<HashMap<String, Interface>> for StaticInterfaceTable {
    fn from(interfaces: HashMap<String, Interface>) -> Self {
        StaticInterfaceTable { interfaces }
    }
}

impl InterfaceTable for StaticInterfaceTable {
    fn lookup_by_ip(&self, ip: Ipv4Addr) -> Option<Interface> {
        self.interfaces
            .values()
            .find(|interface| interface.ip == ip)
            .cloned()
    }

    fn all(&self) -> Vec<Interface> {
        let mut all: Vec<Interface> = self.interfaces.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn lookup_by_name(&self, name: &str) -> Option<Interface> {
        self.interfaces.get(name).cloned()
    }
}

/// A packet along with the name of the interface it arrived on, or is leaving by.
#[derive(Clone, Debug)]
pub struct InterfaceAnnotated<P: Packet> {
    pub packet: P,
    pub interface: String,
}

impl<P: Packet> InterfaceAnnotated<P> {
    pub fn new(packet: P, interface: &str) -> Self {
        InterfaceAnnotated {
            packet,
            interface: interface.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn eth0() -> Interface {
        Interface::new(
            "eth0",
            MacAddr::new([0, 0, 0, 0, 0, 1]),
            Ipv4Addr::new(10, 0, 0, 1),
        )
    }

    fn eth1() -> Interface {
        Interface::new(
            "eth1",
            MacAddr::new([0, 0, 0, 0, 0, 2]),
            Ipv4Addr::new(192, 168, 1, 1),
        )
    }

    #[test]
    fn lookup() {
        let table = StaticInterfaceTable::new(vec![eth1(), eth0()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup_by_ip(Ipv4Addr::new(10, 0, 0, 1)), Some(eth0()));
        assert_eq!(table.lookup_by_ip(Ipv4Addr::new(10, 0, 0, 2)), None);
        assert_eq!(table.lookup_by_name("eth1"), Some(eth1()));
        assert_eq!(table.lookup_by_name("wlan0"), None);
        assert_eq!(table.all(), vec![eth0(), eth1()]);
    }

    #[test]
    fn from_map() {
        let table = StaticInterfaceTable::from(hashmap! {
            "eth0".to_string() => eth0(),
        });
        assert_eq!(table.lookup_by_ip(eth0().ip), Some(eth0()));
        assert!(!table.is_empty());
    }

    struct ListTable(Vec<Interface>);

    impl InterfaceTable for ListTable {
        fn lookup_by_ip(&self, ip: Ipv4Addr) -> Option<Interface> {
            self.0.iter().find(|i| i.ip == ip).cloned()
        }

        fn all(&self) -> Vec<Interface> {
            self.0.clone()
        }
    }

    #[test]
    fn default_lookup_by_name_scans_all() {
        let table = ListTable(vec![eth0(), eth1()]);
        assert_eq!(table.lookup_by_name("eth1"), Some(eth1()));
        assert_eq!(table.lookup_by_name("eth2"), None);
    }
}
