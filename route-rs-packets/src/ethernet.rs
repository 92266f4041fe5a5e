use crate::*;
use std::borrow::Cow;
use std::convert::TryInto;
use std::fmt;

pub const ETHERNET_HEADER_LEN: usize = 14;

/// The 14 byte Ethernet II link header, decoded into host order.
///
/// ```text
/// 0                    6                    12                    14
/// |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType--|
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dest_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ether_type: u16,
}

impl EthernetHeader {
    pub fn new(ether_type: u16, src_mac: MacAddr, dest_mac: MacAddr) -> Self {
        EthernetHeader {
            dest_mac,
            src_mac,
            ether_type,
        }
    }

    pub fn encode(&self) -> [u8; ETHERNET_HEADER_LEN] {
        let mut header = [0; ETHERNET_HEADER_LEN];
        header[0..6].copy_from_slice(&self.dest_mac.bytes);
        header[6..12].copy_from_slice(&self.src_mac.bytes);
        header[12..14].copy_from_slice(&self.ether_type.to_be_bytes());
        header
    }

    /// Decodes the header from the front of `bytes`. Anything after the first 14 bytes is
    /// payload and is not looked at.
    pub fn decode(bytes: &[u8]) -> Result<EthernetHeader, MalformedFrame> {
        if bytes.len() < ETHERNET_HEADER_LEN {
            return Err(MalformedFrame(
                "Frame is less than the minimum of 14 bytes",
            ));
        }

        let mut dest = [0; 6];
        let mut src = [0; 6];
        dest.copy_from_slice(&bytes[0..6]);
        src.copy_from_slice(&bytes[6..12]);
        Ok(EthernetHeader {
            dest_mac: MacAddr::new(dest),
            src_mac: MacAddr::new(src),
            ether_type: u16::from_be_bytes([bytes[12], bytes[13]]),
        })
    }
}

impl fmt::Display for EthernetHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "---- ETHERNET HEADER ----")?;
        writeln!(f, "Dest Eth Addr: {}", self.dest_mac)?;
        writeln!(f, "Src Eth Addr: {}", self.src_mac)?;
        write!(f, "Pkt Type: {:#06x}", self.ether_type)
    }
}

#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
    pub layer2_offset: usize,
    pub payload_offset: usize,
}

impl Packet for EthernetFrame {}

impl EthernetFrame {
    pub fn from_buffer(frame: PacketData, layer2_offset: usize) -> Result<EthernetFrame, MalformedFrame> {
        // We could support other formats for the frames, but IP sits atop Ethernet II
        if frame.len() < layer2_offset + ETHERNET_HEADER_LEN {
            return Err(MalformedFrame(
                "Frame is less than the minimum of 14 bytes",
            ));
        }

        Ok(EthernetFrame {
            data: frame,
            layer2_offset,
            payload_offset: ETHERNET_HEADER_LEN + layer2_offset, // To support 802.1Q VLAN Tagging, this number may be different.
        })
    }

    /// Returns an empty EthernetFrame where all values all populated to zero. This function allocates a
    /// new array to hold the header.
    pub fn empty() -> EthernetFrame {
        EthernetFrame {
            data: vec![0; ETHERNET_HEADER_LEN],
            layer2_offset: 0,
            payload_offset: ETHERNET_HEADER_LEN,
        }
    }

    /// Builds a frame from an encoded header followed by `payload`.
    pub fn new(header: EthernetHeader, payload: &[u8]) -> EthernetFrame {
        let mut data = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
        data.extend_from_slice(&header.encode());
        data.extend_from_slice(payload);
        EthernetFrame {
            data,
            layer2_offset: 0,
            payload_offset: ETHERNET_HEADER_LEN,
        }
    }

    pub fn header(&self) -> EthernetHeader {
        EthernetHeader {
            dest_mac: self.dest_mac(),
            src_mac: self.src_mac(),
            ether_type: self.ether_type(),
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        self.mac_at(self.layer2_offset)
    }

    pub fn src_mac(&self) -> MacAddr {
        self.mac_at(self.layer2_offset + 6)
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        let start = self.layer2_offset;
        self.data[start..start + 6].copy_from_slice(&mac.bytes);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        let start = self.layer2_offset + 6;
        self.data[start..start + 6].copy_from_slice(&mac.bytes);
    }

    pub fn ether_type(&self) -> u16 {
        let start = self.layer2_offset + 12;
        u16::from_be_bytes([self.data[start], self.data[start + 1]])
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        let start = self.layer2_offset + 12;
        self.data[start..start + 2].copy_from_slice(&ether_type.to_be_bytes());
    }

    // This gives you a cow of a slice of the payload.
    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    /// The bytes from the start of the Ethernet header onward, which is what goes on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.layer2_offset..]
    }

    fn mac_at(&self, start: usize) -> MacAddr {
        // from_buffer guarantees the header is present
        let bytes: [u8; 6] = self.data[start..start + 6].try_into().unwrap_or([0; 6]);
        MacAddr::new(bytes)
    }
}

/// EthernetFrames are considered the same if they have the same data from the layer 2
/// header and onward. This function does not consider the data before the start of the
/// Ethernet header
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer2_offset..] == other.data[other.layer2_offset..]
    }
}

impl Eq for EthernetFrame {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn ethernet_frame() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0, 0];
        let frame = EthernetFrame::from_buffer(data, 0).unwrap();
        assert_eq!(
            frame.dest_mac(),
            MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0xff, 0xff])
        );
        assert_eq!(frame.src_mac(), MacAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(frame.ether_type(), 0);
        assert_eq!(frame.payload().len(), 0);
    }

    #[test]
    fn set_payload() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0, 0];
        let mut frame = EthernetFrame::from_buffer(data, 0).unwrap();

        let new_payload: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
        frame.set_payload(&new_payload);
        assert_eq!(frame.payload(), new_payload);
        assert_eq!(frame.payload()[2], 3);
    }

    #[test]
    fn invalid_data_length() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6];
        assert_eq!(
            EthernetFrame::from_buffer(data, 0),
            Err(MalformedFrame("Frame is less than the minimum of 14 bytes"))
        );
    }

    #[test]
    fn layer2_offset_counts_toward_minimum() {
        let data: Vec<u8> = vec![0; 15];
        assert!(EthernetFrame::from_buffer(data, 2).is_err());
    }

    #[test]
    fn set_macs_with_offset() {
        let mut data = vec![0xaa, 0xbb];
        data.extend_from_slice(&[0; 14]);
        let mut frame = EthernetFrame::from_buffer(data, 2).unwrap();
        let new_dest = MacAddr::new([0x98, 0x88, 0x18, 0x12, 0xb4, 0xdf]);
        let new_src = MacAddr::new([1, 2, 3, 4, 5, 6]);
        frame.set_dest_mac(new_dest);
        frame.set_src_mac(new_src);
        frame.set_ether_type(ARP_ETHER_TYPE);
        assert_eq!(frame.dest_mac(), new_dest);
        assert_eq!(frame.src_mac(), new_src);
        assert_eq!(frame.ether_type(), ARP_ETHER_TYPE);
        assert_eq!(&frame.data[0..2], &[0xaa, 0xbb]);
        assert_eq!(frame.as_bytes().len(), 14);
    }

    #[test]
    fn ether_type() {
        let data: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x06,
        ];
        let frame = EthernetFrame::from_buffer(data, 0).unwrap();
        assert_eq!(frame.ether_type(), ARP_ETHER_TYPE);
    }

    #[test]
    fn empty() {
        let empty_frame = EthernetFrame::empty();
        assert_eq!(empty_frame.layer2_offset, 0);
        assert_eq!(empty_frame.payload_offset, 14);
        assert_eq!(empty_frame.header(), EthernetHeader::new(0, MacAddr::ZERO, MacAddr::ZERO));
    }

    #[test]
    fn header_encode_is_network_order() {
        let header = EthernetHeader::new(
            ARP_ETHER_TYPE,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            MacAddr::BROADCAST,
        );
        assert_eq!(
            header.encode(),
            [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x06]
        );
    }

    #[test]
    fn header_decode_ignores_payload() {
        let mut bytes = EthernetHeader::new(IPV4_ETHER_TYPE, MacAddr::ZERO, MacAddr::BROADCAST)
            .encode()
            .to_vec();
        bytes.extend_from_slice(&[0x45, 0, 0, 20]);
        let header = EthernetHeader::decode(&bytes).unwrap();
        assert_eq!(header.ether_type, IPV4_ETHER_TYPE);
        assert_eq!(header.dest_mac, MacAddr::BROADCAST);
        assert_eq!(header.src_mac, MacAddr::ZERO);
    }

    #[test]
    fn header_decode_short() {
        assert!(EthernetHeader::decode(&[0; 13]).is_err());
        assert!(EthernetHeader::decode(&[]).is_err());
    }

    #[test]
    fn new_frame_matches_header() {
        let header = EthernetHeader::new(
            ARP_ETHER_TYPE,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            MacAddr::new([6, 5, 4, 3, 2, 1]),
        );
        let frame = EthernetFrame::new(header, &[9, 9, 9]);
        assert_eq!(frame.header(), header);
        assert_eq!(frame.payload(), vec![9, 9, 9]);
    }

    #[test]
    fn header_dump() {
        let header = EthernetHeader::new(
            ARP_ETHER_TYPE,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            MacAddr::BROADCAST,
        );
        let dump = header.to_string();
        assert!(dump.contains("Dest Eth Addr: ff:ff:ff:ff:ff:ff"));
        assert!(dump.contains("Src Eth Addr: 01:02:03:04:05:06"));
        assert!(dump.ends_with("Pkt Type: 0x0806"));
    }
}
