use crate::classifier::Classifier;
use route_rs_packets::{ArpMessage, EthernetFrame, MalformedFrame, ARP_ETHER_TYPE};

/// Which way an inbound frame should be handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArpClass {
    Request,
    Reply,
    /// A well formed ARP frame we have no business with: an unknown opcode, or a
    /// hardware/protocol pairing other than Ethernet/IPv4.
    Other,
    /// Not an ARP frame at all.
    NotArp,
}

/// Sorts Ethernet frames by ARP opcode.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArpOpClassifier;

impl ArpOpClassifier {
    pub fn new() -> Self {
        ArpOpClassifier
    }

    /// Decodes the ARP message in `frame` and classifies it in one step. Frames that are not
    /// ARP come back as `NotArp` with no message.
    pub fn decode(
        &self,
        frame: &EthernetFrame,
    ) -> Result<(ArpClass, Option<ArpMessage>), MalformedFrame> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Ok((ArpClass::NotArp, None));
        }
        let message = ArpMessage::decode(&frame.payload())?;
        Ok((class_of(&message), Some(message)))
    }
}

fn class_of(message: &ArpMessage) -> ArpClass {
    if !message.is_ethernet_ipv4() {
        ArpClass::Other
    } else if message.is_request() {
        ArpClass::Request
    } else if message.is_reply() {
        ArpClass::Reply
    } else {
        ArpClass::Other
    }
}

impl Classifier for ArpOpClassifier {
    type Packet = EthernetFrame;
    type Class = Result<ArpClass, MalformedFrame>;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        self.decode(packet).map(|(class, _)| class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_rs_packets::{ArpFrame, MacAddr, IPV4_ETHER_TYPE};
    use std::net::Ipv4Addr;

    fn request() -> ArpMessage {
        ArpMessage::request(
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 1),
        )
    }

    fn framed(message: &ArpMessage) -> EthernetFrame {
        ArpFrame::new(message, message.sender_mac, MacAddr::BROADCAST).frame()
    }

    #[test]
    fn classifies_by_opcode() {
        let classifier = ArpOpClassifier::new();
        assert_eq!(classifier.classify(&framed(&request())), Ok(ArpClass::Request));

        let reply = ArpMessage::reply_to(&request(), MacAddr::new([9; 6]), request().target_ip);
        assert_eq!(classifier.classify(&framed(&reply)), Ok(ArpClass::Reply));

        let mut odd = request();
        odd.opcode = 3;
        assert_eq!(classifier.classify(&framed(&odd)), Ok(ArpClass::Other));
    }

    #[test]
    fn foreign_protocol_is_other() {
        let mut message = request();
        message.protocol_type = 0x86DD;
        assert_eq!(
            ArpOpClassifier::new().classify(&framed(&message)),
            Ok(ArpClass::Other)
        );
    }

    #[test]
    fn non_arp_frames() {
        let mut frame = EthernetFrame::empty();
        frame.set_ether_type(IPV4_ETHER_TYPE);
        assert_eq!(ArpOpClassifier::new().classify(&frame), Ok(ArpClass::NotArp));
    }

    #[test]
    fn truncated_arp_is_malformed() {
        let mut frame = framed(&request());
        let short = frame.payload()[..10].to_vec();
        frame.set_payload(&short);
        assert!(ArpOpClassifier::new().classify(&frame).is_err());
    }
}
