use crate::classifier::ArpClass;
use crate::error::ArpError;
use crate::interface::TransmitError;
use crate::state::{ArpCacheEntry, Retry, Unreachable};
use route_rs_packets::{MacAddr, MalformedFrame};
use std::net::Ipv4Addr;

/// What handling one inbound frame amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The frame did not decode and was dropped.
    Malformed(MalformedFrame),
    /// Nothing to do: not ARP, an opcode or protocol we don't handle, or a request for an
    /// address that isn't ours.
    Ignored(ArpClass),
    /// A request for one of our addresses was answered.
    Replied {
        answered_for: Ipv4Addr,
        sent: Result<(), TransmitError>,
    },
    /// A reply taught us a mapping, and `released` packets that were waiting on it were handed
    /// to the transmit primitive. `errors` holds any of those that failed.
    Learned {
        ip: Ipv4Addr,
        mac: MacAddr,
        released: usize,
        errors: Vec<ArpError>,
    },
}

/// Whether resolving an outbound packet's next hop put a request on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestStatus {
    /// A request for this address was already outstanding.
    Outstanding,
    Sent,
    /// The request couldn't be sent. The packet stays queued and the next retry tries again.
    Failed(TransmitError),
}

/// What `ArpDispatcher::resolve_and_send` did with an outbound packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The mapping was cached and the packet went straight out to this address.
    Sent(MacAddr),
    /// The packet is held until a reply arrives or resolution gives up. `overflowed` is set when
    /// holding it pushed an older packet for the same address out of the queue.
    Queued {
        request: RequestStatus,
        overflowed: bool,
    },
}

/// Everything one maintenance pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired: Vec<ArpCacheEntry>,
    pub retried: Vec<Retry>,
    /// Addresses given up on, carrying the packets that were dropped with them.
    pub unreachable: Vec<Unreachable>,
    /// Retry requests that could not be sent.
    pub errors: Vec<ArpError>,
}

impl MaintenanceReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty()
            && self.retried.is_empty()
            && self.unreachable.is_empty()
            && self.errors.is_empty()
    }

    /// One `UnreachableTarget` error per address given up on, for callers that report
    /// failures per packet source.
    pub fn unreachable_errors(&self) -> Vec<ArpError> {
        self.unreachable
            .iter()
            .map(|unreachable| ArpError::UnreachableTarget {
                target: unreachable.target_ip,
                dropped: unreachable.dropped.len(),
            })
            .collect()
    }
}
