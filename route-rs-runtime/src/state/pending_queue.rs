use route_rs_packets::EthernetFrame;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// An outbound frame waiting on its next hop's hardware address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPacket {
    pub frame: EthernetFrame,
    pub interface: String,
}

/// Resolution state for one unresolved address.
#[derive(Clone, Debug)]
pub struct PendingEntry {
    pub target_ip: Ipv4Addr,
    /// Interface the requests for this address go out on: the egress interface of the packet
    /// that created the entry.
    pub interface: String,
    pub queued_packets: VecDeque<PendingPacket>,
    pub first_requested_at: Instant,
    pub last_requested_at: Instant,
    /// Requests sent so far, the initial one included.
    pub attempts: u32,
}

/// Result of `PendingResolutionQueue::enqueue`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Enqueued {
    /// First packet for this address. The caller owes the network one request on `interface`.
    NewRequest { interface: String },
    /// Joined an outstanding resolution. `overflowed` holds the packet pushed out when the
    /// queue was already at its cap.
    Queued { overflowed: Option<PendingPacket> },
}

/// An address whose resolution is due for another request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retry {
    pub target_ip: Ipv4Addr,
    pub interface: String,
    pub attempt: u32,
}

/// An address given up on, along with the packets that were waiting for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unreachable {
    pub target_ip: Ipv4Addr,
    pub attempts: u32,
    pub dropped: Vec<PendingPacket>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub retries: Vec<Retry>,
    pub unreachable: Vec<Unreachable>,
}

/// Outbound packets held per unresolved next hop.
///
/// The first packet for an address opens an entry and asks the caller for a request. Later
/// packets queue behind it, up to `queue_cap` per address, past which the oldest queued packet
/// is dropped. `tick` asks for a new request every `retry_interval` and gives up once more than
/// `max_attempts` requests would have been sent.
#[derive(Debug)]
pub struct PendingResolutionQueue {
    pending: HashMap<Ipv4Addr, PendingEntry>,
    retry_interval: Duration,
    max_attempts: u32,
    queue_cap: usize,
}

impl PendingResolutionQueue {
    pub fn new(retry_interval: Duration, max_attempts: u32, queue_cap: usize) -> Self {
        assert!(queue_cap > 0, "queue_cap must be at least 1");
        PendingResolutionQueue {
            pending: HashMap::new(),
            retry_interval,
            max_attempts,
            queue_cap,
        }
    }

    pub fn enqueue(
        &mut self,
        target_ip: Ipv4Addr,
        frame: EthernetFrame,
        interface: &str,
        now: Instant,
    ) -> Enqueued {
        let packet = PendingPacket {
            frame,
            interface: interface.to_string(),
        };

        match self.pending.get_mut(&target_ip) {
            Some(entry) => {
                let overflowed = if entry.queued_packets.len() >= self.queue_cap {
                    entry.queued_packets.pop_front()
                } else {
                    None
                };
                entry.queued_packets.push_back(packet);
                Enqueued::Queued { overflowed }
            }
            None => {
                let mut queued_packets = VecDeque::new();
                queued_packets.push_back(packet);
                self.pending.insert(
                    target_ip,
                    PendingEntry {
                        target_ip,
                        interface: interface.to_string(),
                        queued_packets,
                        first_requested_at: now,
                        last_requested_at: now,
                        attempts: 1,
                    },
                );
                Enqueued::NewRequest {
                    interface: interface.to_string(),
                }
            }
        }
    }

    /// Removes the entry for `target_ip`, returning its packets in the order they were queued.
    pub fn resolve(&mut self, target_ip: Ipv4Addr) -> Vec<PendingPacket> {
        self.pending
            .remove(&target_ip)
            .map(|entry| entry.queued_packets.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let mut given_up = vec![];

        for entry in self.pending.values_mut() {
            if now.saturating_duration_since(entry.last_requested_at) < self.retry_interval {
                continue;
            }
            entry.attempts += 1;
            if entry.attempts > self.max_attempts {
                given_up.push(entry.target_ip);
            } else {
                entry.last_requested_at = now;
                outcome.retries.push(Retry {
                    target_ip: entry.target_ip,
                    interface: entry.interface.clone(),
                    attempt: entry.attempts,
                });
            }
        }

        for target_ip in given_up {
            if let Some(entry) = self.pending.remove(&target_ip) {
                outcome.unreachable.push(Unreachable {
                    target_ip,
                    attempts: entry.attempts - 1,
                    dropped: entry.queued_packets.into_iter().collect(),
                });
            }
        }

        outcome.retries.sort_by_key(|retry| retry.target_ip);
        outcome.unreachable.sort_by_key(|unreachable| unreachable.target_ip);
        outcome
    }

    pub fn is_pending(&self, target_ip: Ipv4Addr) -> bool {
        self.pending.contains_key(&target_ip)
    }

    pub fn get(&self, target_ip: Ipv4Addr) -> Option<&PendingEntry> {
        self.pending.get(&target_ip)
    }

    /// Number of packets waiting on `target_ip`.
    pub fn queued(&self, target_ip: Ipv4Addr) -> usize {
        self.pending
            .get(&target_ip)
            .map_or(0, |entry| entry.queued_packets.len())
    }

    /// Number of addresses being resolved.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
