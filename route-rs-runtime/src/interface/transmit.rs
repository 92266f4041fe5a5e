use crossbeam::crossbeam_channel::Sender;
use std::error::Error;
use std::fmt;

/// A frame could not be put on the wire. Reported back to the caller, never retried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitError {
    pub interface: String,
    pub reason: String,
}

impl TransmitError {
    pub fn new(interface: &str, reason: &str) -> Self {
        TransmitError {
            interface: interface.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to send on {}: {}", self.interface, self.reason)
    }
}

impl Error for TransmitError {}

/// The raw frame send primitive, e.g. an AF_PACKET socket per interface.
pub trait Transmit {
    fn send(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError>;
}

/// A frame handed to a `ChannelTransmit`, tagged with its egress interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub interface: String,
    pub frame: Vec<u8>,
}

/// Transmit that forwards every frame into a crossbeam channel, for an I/O thread (or a test) on
/// the other end to drain.
#[derive(Clone)]
pub struct ChannelTransmit {
    sender: Sender<Outbound>,
}

impl ChannelTransmit {
    pub fn new(sender: Sender<Outbound>) -> Self {
        ChannelTransmit { sender }
    }
}

impl Transmit for ChannelTransmit {
    fn send(&self, frame: &[u8], interface: &str) -> Result<(), TransmitError> {
        self.sender
            .send(Outbound {
                interface: interface.to_string(),
                frame: frame.to_vec(),
            })
            .map_err(|_| TransmitError::new(interface, "channel receiver hung up"))
    }
}
