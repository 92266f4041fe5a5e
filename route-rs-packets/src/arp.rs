use crate::*;
use std::convert::TryFrom;
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

/// Length of an Ethernet/IPv4 ARP payload: 8 bytes of fixed fields plus two 6 byte hardware
/// addresses and two 4 byte protocol addresses.
pub const ARP_PAYLOAD_LEN: usize = 28;
pub const ETHERNET_ADDR_LEN: u8 = 6;
pub const IPV4_ADDR_LEN: u8 = 4;

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_RANGE: (usize, usize) = (4, 5);
const PROTOCOL_ADDR_LEN_RANGE: (usize, usize) = (5, 6);
const OPCODE_RANGE: (usize, usize) = (6, 8);
const SENDER_HARDWARE_ADDR_RANGE: (usize, usize) = (8, 14);
const SENDER_PROTOCOL_ADDR_RANGE: (usize, usize) = (14, 18);
const TARGET_HARDWARE_ADDR_RANGE: (usize, usize) = (18, 24);
const TARGET_PROTOCOL_ADDR_RANGE: (usize, usize) = (24, 28);

///
/// Decoded ARP header for Ethernet hardware addresses and IPv4 protocol addresses, as described
/// in RFC 826 https://tools.ietf.org/html/rfc826
///
/// Multi-byte numeric fields are held in host order. IPv4 addresses keep the byte order they
/// had on the wire.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpMessage {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_addr_len: u8,
    pub protocol_addr_len: u8,
    pub opcode: u16,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    /// A who-has request from `sender_mac`/`sender_ip` for `target_ip`. The target hardware
    /// address is left zeroed since it is the value being asked for.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpMessage {
            hardware_type: ArpHardwareType::Ethernet as u16,
            protocol_type: IPV4_ETHER_TYPE,
            hardware_addr_len: ETHERNET_ADDR_LEN,
            protocol_addr_len: IPV4_ADDR_LEN,
            opcode: ArpOp::Request as u16,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::ZERO,
            target_ip,
        }
    }

    /// Swaps hardware and protocol fields, putting the local hardware and protocol addresses
    /// in the sender fields, and sets the opcode to reply.
    pub fn reply_to(request: &ArpMessage, own_mac: MacAddr, own_ip: Ipv4Addr) -> Self {
        ArpMessage {
            opcode: ArpOp::Reply as u16,
            sender_mac: own_mac,
            sender_ip: own_ip,
            target_mac: request.sender_mac,
            target_ip: request.sender_ip,
            ..*request
        }
    }

    pub fn is_request(&self) -> bool {
        self.opcode == ArpOp::Request as u16
    }

    pub fn is_reply(&self) -> bool {
        self.opcode == ArpOp::Reply as u16
    }

    /// True for Ethernet hardware addresses resolving IPv4, the only pairing we speak.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hardware_type == ArpHardwareType::Ethernet as u16
            && self.protocol_type == IPV4_ETHER_TYPE
    }

    pub fn encode(&self) -> [u8; ARP_PAYLOAD_LEN] {
        let mut payload = [0; ARP_PAYLOAD_LEN];
        put(&mut payload, HARDWARE_TYPE_RANGE, &self.hardware_type.to_be_bytes());
        put(&mut payload, PROTOCOL_TYPE_RANGE, &self.protocol_type.to_be_bytes());
        put(&mut payload, HARDWARE_ADDR_LEN_RANGE, &[self.hardware_addr_len]);
        put(&mut payload, PROTOCOL_ADDR_LEN_RANGE, &[self.protocol_addr_len]);
        put(&mut payload, OPCODE_RANGE, &self.opcode.to_be_bytes());
        put(&mut payload, SENDER_HARDWARE_ADDR_RANGE, &self.sender_mac.bytes);
        put(&mut payload, SENDER_PROTOCOL_ADDR_RANGE, &self.sender_ip.octets());
        put(&mut payload, TARGET_HARDWARE_ADDR_RANGE, &self.target_mac.bytes);
        put(&mut payload, TARGET_PROTOCOL_ADDR_RANGE, &self.target_ip.octets());
        payload
    }

    ///
    /// Decodes an ARP payload. Validates
    /// - The payload holds at least the 28 bytes of an Ethernet/IPv4 ARP header
    /// - The address length fields are 6 and 4
    ///
    /// Bytes past the header, such as Ethernet minimum frame padding, are ignored.
    ///
    pub fn decode(payload: &[u8]) -> Result<ArpMessage, MalformedFrame> {
        if payload.len() < ARP_PAYLOAD_LEN {
            return Err(MalformedFrame("ARP payload is too small"));
        }

        let hardware_addr_len = payload[HARDWARE_ADDR_LEN_RANGE.0];
        let protocol_addr_len = payload[PROTOCOL_ADDR_LEN_RANGE.0];
        if hardware_addr_len != ETHERNET_ADDR_LEN || protocol_addr_len != IPV4_ADDR_LEN {
            return Err(MalformedFrame(
                "ARP payload doesn't match address length fields",
            ));
        }

        Ok(ArpMessage {
            hardware_type: be_u16(payload, HARDWARE_TYPE_RANGE),
            protocol_type: be_u16(payload, PROTOCOL_TYPE_RANGE),
            hardware_addr_len,
            protocol_addr_len,
            opcode: be_u16(payload, OPCODE_RANGE),
            sender_mac: mac(payload, SENDER_HARDWARE_ADDR_RANGE),
            sender_ip: ipv4(payload, SENDER_PROTOCOL_ADDR_RANGE),
            target_mac: mac(payload, TARGET_HARDWARE_ADDR_RANGE),
            target_ip: ipv4(payload, TARGET_PROTOCOL_ADDR_RANGE),
        })
    }
}

impl fmt::Display for ArpMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = match self.opcode {
            1 => "request",
            2 => "reply",
            _ => "unknown",
        };
        write!(
            f,
            "ARP {} (op {}) hrd {:#06x} pro {:#06x}: {} @ {} -> {} @ {}",
            op,
            self.opcode,
            self.hardware_type,
            self.protocol_type,
            self.sender_ip,
            self.sender_mac,
            self.target_ip,
            self.target_mac
        )
    }
}

fn put(payload: &mut [u8], (start, end): (usize, usize), bytes: &[u8]) {
    payload[start..end].copy_from_slice(bytes);
}

fn be_u16(payload: &[u8], (start, _): (usize, usize)) -> u16 {
    u16::from_be_bytes([payload[start], payload[start + 1]])
}

fn mac(payload: &[u8], (start, end): (usize, usize)) -> MacAddr {
    let mut bytes = [0; 6];
    bytes.copy_from_slice(&payload[start..end]);
    MacAddr::new(bytes)
}

fn ipv4(payload: &[u8], (start, _): (usize, usize)) -> Ipv4Addr {
    Ipv4Addr::new(
        payload[start],
        payload[start + 1],
        payload[start + 2],
        payload[start + 3],
    )
}

///
/// EthernetFrame wrapper with getters/setters for the Ethernet/IPv4 ARP packet structure.
/// Construction through `TryFrom` guarantees the frame carries a full ARP header, so the
/// accessors never run off the end of the buffer.
///
#[derive(Clone, Debug)]
pub struct ArpFrame {
    frame: EthernetFrame,
}

impl ArpFrame {
    /// Wraps `message` in a frame from `src_mac` to `dest_mac` with the ARP ether type.
    pub fn new(message: &ArpMessage, src_mac: MacAddr, dest_mac: MacAddr) -> Self {
        let header = EthernetHeader::new(ARP_ETHER_TYPE, src_mac, dest_mac);
        ArpFrame {
            frame: EthernetFrame::new(header, &message.encode()),
        }
    }

    pub fn message(&self) -> ArpMessage {
        ArpMessage {
            hardware_type: self.hardware_type(),
            protocol_type: self.protocol_type(),
            hardware_addr_len: self.arp_data(HARDWARE_ADDR_LEN_RANGE)[0],
            protocol_addr_len: self.arp_data(PROTOCOL_ADDR_LEN_RANGE)[0],
            opcode: self.opcode(),
            sender_mac: self.sender_mac_addr(),
            sender_ip: self.sender_ipv4_addr(),
            target_mac: self.target_mac_addr(),
            target_ip: self.target_ipv4_addr(),
        }
    }

    pub fn hardware_type(&self) -> u16 {
        be_u16(self.payload(), HARDWARE_TYPE_RANGE)
    }

    pub fn protocol_type(&self) -> u16 {
        be_u16(self.payload(), PROTOCOL_TYPE_RANGE)
    }

    pub fn opcode(&self) -> u16 {
        be_u16(self.payload(), OPCODE_RANGE)
    }

    pub fn sender_mac_addr(&self) -> MacAddr {
        mac(self.payload(), SENDER_HARDWARE_ADDR_RANGE)
    }

    pub fn sender_ipv4_addr(&self) -> Ipv4Addr {
        ipv4(self.payload(), SENDER_PROTOCOL_ADDR_RANGE)
    }

    pub fn target_mac_addr(&self) -> MacAddr {
        mac(self.payload(), TARGET_HARDWARE_ADDR_RANGE)
    }

    pub fn target_ipv4_addr(&self) -> Ipv4Addr {
        ipv4(self.payload(), TARGET_PROTOCOL_ADDR_RANGE)
    }

    pub fn set_opcode(&mut self, code: u16) {
        self.set_arp_data(&code.to_be_bytes(), OPCODE_RANGE);
    }

    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        self.set_arp_data(&addr.bytes, SENDER_HARDWARE_ADDR_RANGE);
    }

    pub fn set_sender_protocol_addr(&mut self, ip_addr: Ipv4Addr) {
        self.set_arp_data(&ip_addr.octets(), SENDER_PROTOCOL_ADDR_RANGE);
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        self.set_arp_data(&addr.bytes, TARGET_HARDWARE_ADDR_RANGE);
    }

    pub fn set_target_protocol_addr(&mut self, ip_addr: Ipv4Addr) {
        self.set_arp_data(&ip_addr.octets(), TARGET_PROTOCOL_ADDR_RANGE);
    }

    pub fn ethernet_header(&self) -> EthernetHeader {
        self.frame.header()
    }

    // Move ownership of the frame back to the caller
    pub fn frame(self) -> EthernetFrame {
        self.frame
    }

    fn payload(&self) -> &[u8] {
        &self.frame.data[self.frame.payload_offset..]
    }

    fn arp_data(&self, (start, end): (usize, usize)) -> &[u8] {
        &self.payload()[start..end]
    }

    fn set_arp_data(&mut self, bytes: &[u8], (start, end): (usize, usize)) {
        let offset = self.frame.payload_offset;
        self.frame.data[offset + start..offset + end].copy_from_slice(bytes);
    }
}

impl TryFrom<EthernetFrame> for ArpFrame {
    type Error = MalformedFrame;

    ///
    /// Decorates the given EthernetFrame with ArpFrame getters/setters.
    /// Validates
    /// - The frame has an ARP ether type
    /// - The payload passes the same checks as `ArpMessage::decode`
    ///
    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Err(MalformedFrame("Frame does not have ARP ether type."));
        };

        ArpMessage::decode(&frame.data[frame.payload_offset..])?;
        Ok(ArpFrame { frame })
    }
}
