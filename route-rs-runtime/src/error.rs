use crate::interface::TransmitError;
use route_rs_packets::MalformedFrame;
use std::error::Error;
use std::fmt;
use std::net::Ipv4Addr;

/// Everything that can go wrong while resolving addresses. None of these are fatal: a malformed
/// frame is dropped, an unreachable target drops its queued packets, and a failed transmit is
/// handed back to whoever asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArpError {
    MalformedFrame(MalformedFrame),
    /// Resolution gave up after the configured number of requests. `dropped` is how many
    /// queued packets went with it.
    UnreachableTarget { target: Ipv4Addr, dropped: usize },
    Transmit(TransmitError),
    UnknownInterface(String),
}

impl fmt::Display for ArpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArpError::MalformedFrame(err) => write!(f, "{}", err),
            ArpError::UnreachableTarget { target, dropped } => write!(
                f,
                "no ARP reply from {}, dropped {} queued packet(s)",
                target, dropped
            ),
            ArpError::Transmit(err) => write!(f, "{}", err),
            ArpError::UnknownInterface(name) => write!(f, "unknown interface {:?}", name),
        }
    }
}

impl Error for ArpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ArpError::MalformedFrame(err) => Some(err),
            ArpError::Transmit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MalformedFrame> for ArpError {
    fn from(err: MalformedFrame) -> Self {
        ArpError::MalformedFrame(err)
    }
}

impl From<TransmitError> for ArpError {
    fn from(err: TransmitError) -> Self {
        ArpError::Transmit(err)
    }
}
