use crate::classifier::ArpClass;
use crate::interface::TransmitError;
use crate::state::{ArpCacheEntry, Inserted, PendingPacket, Unreachable};
use crate::telemetry::ArpTelemetry;
use route_rs_packets::{MacAddr, MalformedFrame};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Running totals of ARP events. Share it behind an `Arc` to read the numbers while the
/// dispatcher keeps counting.
#[derive(Debug, Default)]
pub struct ArpCounters {
    requests_received: AtomicUsize,
    replies_received: AtomicUsize,
    malformed: AtomicUsize,
    replies_sent: AtomicUsize,
    learned: AtomicUsize,
    evicted: AtomicUsize,
    expired: AtomicUsize,
    requests_sent: AtomicUsize,
    queue_overflows: AtomicUsize,
    unreachable: AtomicUsize,
    packets_dropped: AtomicUsize,
    transmit_failures: AtomicUsize,
}

/// Point in time copy of `ArpCounters`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub requests_received: usize,
    pub replies_received: usize,
    pub malformed: usize,
    pub replies_sent: usize,
    pub learned: usize,
    pub evicted: usize,
    pub expired: usize,
    pub requests_sent: usize,
    pub queue_overflows: usize,
    pub unreachable: usize,
    /// Queued packets thrown away, by overflow or by giving up on their target.
    pub packets_dropped: usize,
    pub transmit_failures: usize,
}

impl ArpCounters {
    pub fn new() -> Self {
        ArpCounters::default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let get = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        CounterSnapshot {
            requests_received: get(&self.requests_received),
            replies_received: get(&self.replies_received),
            malformed: get(&self.malformed),
            replies_sent: get(&self.replies_sent),
            learned: get(&self.learned),
            evicted: get(&self.evicted),
            expired: get(&self.expired),
            requests_sent: get(&self.requests_sent),
            queue_overflows: get(&self.queue_overflows),
            unreachable: get(&self.unreachable),
            packets_dropped: get(&self.packets_dropped),
            transmit_failures: get(&self.transmit_failures),
        }
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl ArpTelemetry for ArpCounters {
    fn classified(&self, _interface: &str, class: ArpClass) {
        match class {
            ArpClass::Request => bump(&self.requests_received),
            ArpClass::Reply => bump(&self.replies_received),
            _ => {}
        }
    }

    fn malformed(&self, _interface: &str, _err: &MalformedFrame) {
        bump(&self.malformed);
    }

    fn replied(&self, _interface: &str, _requester: Ipv4Addr, _answered_for: Ipv4Addr) {
        bump(&self.replies_sent);
    }

    fn cache_inserted(&self, _ip: Ipv4Addr, _mac: MacAddr, outcome: &Inserted) {
        bump(&self.learned);
        if let Inserted::Evicted(_) = outcome {
            bump(&self.evicted);
        }
    }

    fn cache_expired(&self, _entry: &ArpCacheEntry) {
        bump(&self.expired);
    }

    fn request_sent(&self, _target: Ipv4Addr, _interface: &str, _attempt: u32) {
        bump(&self.requests_sent);
    }

    fn queue_overflow(&self, _target: Ipv4Addr, _dropped: &PendingPacket) {
        bump(&self.queue_overflows);
        bump(&self.packets_dropped);
    }

    fn unreachable(&self, unreachable: &Unreachable) {
        bump(&self.unreachable);
        self.packets_dropped
            .fetch_add(unreachable.dropped.len(), Ordering::Relaxed);
    }

    fn transmit_failed(&self, _err: &TransmitError) {
        bump(&self.transmit_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn counts() {
        let counters = ArpCounters::new();
        counters.classified("eth0", ArpClass::Request);
        counters.classified("eth0", ArpClass::Reply);
        counters.classified("eth0", ArpClass::NotArp);
        counters.malformed("eth0", &MalformedFrame("ARP payload is too small"));
        counters.cache_inserted(
            Ipv4Addr::new(10, 0, 0, 5),
            MacAddr::ZERO,
            &Inserted::Evicted(ArpCacheEntry {
                ip: Ipv4Addr::new(10, 0, 0, 1),
                mac: MacAddr::ZERO,
                learned_at: Instant::now(),
            }),
        );
        counters.unreachable(&Unreachable {
            target_ip: Ipv4Addr::new(10, 0, 0, 9),
            attempts: 5,
            dropped: vec![],
        });

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.requests_received, 1);
        assert_eq!(snapshot.replies_received, 1);
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.learned, 1);
        assert_eq!(snapshot.evicted, 1);
        assert_eq!(snapshot.unreachable, 1);
        assert_eq!(snapshot.packets_dropped, 0);
        assert_eq!(snapshot.requests_sent, 0);
    }
}
