//! Observability hook for the ARP core. Every point where the old router would have printed
//! something is a method here, so the dispatcher never logs inline.
use crate::classifier::ArpClass;
use crate::interface::TransmitError;
use crate::state::{ArpCacheEntry, Inserted, PendingPacket, Unreachable};
use route_rs_packets::{MacAddr, MalformedFrame};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

mod counters;
pub use self::counters::*;

/// Called by the dispatcher at each decision point. All methods default to doing nothing.
pub trait ArpTelemetry: Send + Sync {
    fn classified(&self, _interface: &str, _class: ArpClass) {}

    fn malformed(&self, _interface: &str, _err: &MalformedFrame) {}

    fn replied(&self, _interface: &str, _requester: Ipv4Addr, _answered_for: Ipv4Addr) {}

    fn cache_inserted(&self, _ip: Ipv4Addr, _mac: MacAddr, _outcome: &Inserted) {}

    fn cache_expired(&self, _entry: &ArpCacheEntry) {}

    fn request_sent(&self, _target: Ipv4Addr, _interface: &str, _attempt: u32) {}

    fn queue_overflow(&self, _target: Ipv4Addr, _dropped: &PendingPacket) {}

    fn unreachable(&self, _unreachable: &Unreachable) {}

    fn transmit_failed(&self, _err: &TransmitError) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTelemetry;

impl ArpTelemetry for NoTelemetry {}

/// Emits every event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl ArpTelemetry for TracingTelemetry {
    fn classified(&self, interface: &str, class: ArpClass) {
        debug!(interface, class = ?class, "classified frame");
    }

    fn malformed(&self, interface: &str, err: &MalformedFrame) {
        warn!(interface, reason = err.0, "dropping malformed frame");
    }

    fn replied(&self, interface: &str, requester: Ipv4Addr, answered_for: Ipv4Addr) {
        debug!(
            interface,
            requester = %requester,
            answered_for = %answered_for,
            "sent ARP reply"
        );
    }

    fn cache_inserted(&self, ip: Ipv4Addr, mac: MacAddr, outcome: &Inserted) {
        match outcome {
            Inserted::New => debug!(ip = %ip, mac = %mac, "learned mapping"),
            Inserted::Refreshed { previous } if *previous != mac => {
                info!(ip = %ip, mac = %mac, previous = %previous, "mapping changed")
            }
            Inserted::Refreshed { .. } => debug!(ip = %ip, mac = %mac, "refreshed mapping"),
            Inserted::Evicted(evicted) => info!(
                ip = %ip,
                mac = %mac,
                evicted_ip = %evicted.ip,
                evicted_mac = %evicted.mac,
                "cache full, evicted oldest mapping"
            ),
        }
    }

    fn cache_expired(&self, entry: &ArpCacheEntry) {
        info!(ip = %entry.ip, mac = %entry.mac, "mapping expired");
    }

    fn request_sent(&self, target: Ipv4Addr, interface: &str, attempt: u32) {
        if attempt > 1 {
            info!(target = %target, interface, attempt, "re-sent ARP request");
        } else {
            debug!(target = %target, interface, "broadcast ARP request");
        }
    }

    fn queue_overflow(&self, target: Ipv4Addr, dropped: &PendingPacket) {
        warn!(
            target = %target,
            interface = dropped.interface.as_str(),
            "pending queue full, dropped oldest packet"
        );
    }

    fn unreachable(&self, unreachable: &Unreachable) {
        warn!(
            target = %unreachable.target_ip,
            attempts = unreachable.attempts,
            dropped = unreachable.dropped.len(),
            "no ARP reply, giving up"
        );
    }

    fn transmit_failed(&self, err: &TransmitError) {
        warn!(
            interface = err.interface.as_str(),
            reason = err.reason.as_str(),
            "transmit failed"
        );
    }
}

/// Fans every event out to two sinks, e.g. tracing plus counters.
#[derive(Clone, Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: ArpTelemetry, B: ArpTelemetry> ArpTelemetry for Tee<A, B> {
    fn classified(&self, interface: &str, class: ArpClass) {
        self.0.classified(interface, class);
        self.1.classified(interface, class);
    }

    fn malformed(&self, interface: &str, err: &MalformedFrame) {
        self.0.malformed(interface, err);
        self.1.malformed(interface, err);
    }

    fn replied(&self, interface: &str, requester: Ipv4Addr, answered_for: Ipv4Addr) {
        self.0.replied(interface, requester, answered_for);
        self.1.replied(interface, requester, answered_for);
    }

    fn cache_inserted(&self, ip: Ipv4Addr, mac: MacAddr, outcome: &Inserted) {
        self.0.cache_inserted(ip, mac, outcome);
        self.1.cache_inserted(ip, mac, outcome);
    }

    fn cache_expired(&self, entry: &ArpCacheEntry) {
        self.0.cache_expired(entry);
        self.1.cache_expired(entry);
    }

    fn request_sent(&self, target: Ipv4Addr, interface: &str, attempt: u32) {
        self.0.request_sent(target, interface, attempt);
        self.1.request_sent(target, interface, attempt);
    }

    fn queue_overflow(&self, target: Ipv4Addr, dropped: &PendingPacket) {
        self.0.queue_overflow(target, dropped);
        self.1.queue_overflow(target, dropped);
    }

    fn unreachable(&self, unreachable: &Unreachable) {
        self.0.unreachable(unreachable);
        self.1.unreachable(unreachable);
    }

    fn transmit_failed(&self, err: &TransmitError) {
        self.0.transmit_failed(err);
        self.1.transmit_failed(err);
    }
}

impl<T: ArpTelemetry> ArpTelemetry for std::sync::Arc<T> {
    fn classified(&self, interface: &str, class: ArpClass) {
        (**self).classified(interface, class)
    }

    fn malformed(&self, interface: &str, err: &MalformedFrame) {
        (**self).malformed(interface, err)
    }

    fn replied(&self, interface: &str, requester: Ipv4Addr, answered_for: Ipv4Addr) {
        (**self).replied(interface, requester, answered_for)
    }

    fn cache_inserted(&self, ip: Ipv4Addr, mac: MacAddr, outcome: &Inserted) {
        (**self).cache_inserted(ip, mac, outcome)
    }

    fn cache_expired(&self, entry: &ArpCacheEntry) {
        (**self).cache_expired(entry)
    }

    fn request_sent(&self, target: Ipv4Addr, interface: &str, attempt: u32) {
        (**self).request_sent(target, interface, attempt)
    }

    fn queue_overflow(&self, target: Ipv4Addr, dropped: &PendingPacket) {
        (**self).queue_overflow(target, dropped)
    }

    fn unreachable(&self, unreachable: &Unreachable) {
        (**self).unreachable(unreachable)
    }

    fn transmit_failed(&self, err: &TransmitError) {
        (**self).transmit_failed(err)
    }
}
