use crate::interface::Interface;
use crate::processor::Processor;
use route_rs_packets::{ArpFrame, ArpMessage, EthernetFrame, MacAddr};
use std::net::Ipv4Addr;

/// Builds the broadcast request we send when the next hop's hardware address is unknown.
///
/// From RFC 826: the Address Resolution module sets
///
/// Hardware Type: ares_hrd$Ethernet = 1
/// Protocol Type: type that is being resolved
/// Hardware Address Length: 6 (the number of bytes in a 48.bit Ethernet address)
/// Protocol Address Length: length of an address in that protocol
/// Op: ares_op$REQUEST = 1
/// Sender Hardware Address: the 48.bit ethernet address of itself
/// Sender Protocol Address: the protocol address of itself
/// Target Protocol Address: the protocol address of the machine that is trying to be accessed.
///
/// The Target Hardware Address is left zeroed, because it is this value that we are trying to
/// determine. The frame is addressed to the Ethernet broadcast address.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArpRequestBuilder;

impl ArpRequestBuilder {
    pub fn new() -> Self {
        ArpRequestBuilder
    }

    pub fn build(own_mac: MacAddr, own_ip: Ipv4Addr, target_ip: Ipv4Addr) -> EthernetFrame {
        let request = ArpMessage::request(own_mac, own_ip, target_ip);
        ArpFrame::new(&request, own_mac, MacAddr::BROADCAST).frame()
    }
}

impl Processor for ArpRequestBuilder {
    type Input = (Interface, Ipv4Addr);
    type Output = EthernetFrame;

    fn process(&mut self, (interface, target_ip): Self::Input) -> Option<Self::Output> {
        Some(ArpRequestBuilder::build(interface.mac, interface.ip, target_ip))
    }
}
