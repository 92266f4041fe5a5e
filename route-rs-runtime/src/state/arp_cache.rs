use route_rs_packets::MacAddr;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// A learned IPv4 to Ethernet mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpCacheEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub learned_at: Instant,
}

/// What `ArpCache::insert` had to do to store a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inserted {
    New,
    /// The address was already cached; its mac and timestamp were replaced.
    Refreshed { previous: MacAddr },
    /// The cache was full, so the oldest entry was dropped to make room.
    Evicted(ArpCacheEntry),
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    mac: MacAddr,
    learned_at: Instant,
    // Insertion order, to break ties between entries learned at the same instant.
    seq: u64,
}

/// Bounded table of IPv4 to Ethernet mappings.
///
/// Holds at most `capacity` entries and at most one per address. When full, inserting a new
/// address evicts the entry with the oldest `learned_at` (earliest inserted first on ties).
/// Entries older than `ttl` are never returned by `lookup`, and are removed by `expire_stale`.
#[derive(Clone, Debug)]
pub struct ArpCache {
    entries: HashMap<Ipv4Addr, Slot>,
    capacity: usize,
    ttl: Duration,
    next_seq: u64,
}

impl ArpCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "ArpCache capacity must be at least 1");
        ArpCache {
            entries: HashMap::with_capacity(capacity),
            capacity,
            ttl,
            next_seq: 0,
        }
    }

    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr, now: Instant) -> Inserted {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(slot) = self.entries.get_mut(&ip) {
            let previous = slot.mac;
            *slot = Slot {
                mac,
                learned_at: now,
                seq,
            };
            return Inserted::Refreshed { previous };
        }

        let outcome = if self.entries.len() >= self.capacity {
            match self.evict_oldest() {
                Some(evicted) => Inserted::Evicted(evicted),
                None => Inserted::New,
            }
        } else {
            Inserted::New
        };

        self.entries.insert(
            ip,
            Slot {
                mac,
                learned_at: now,
                seq,
            },
        );
        outcome
    }

    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        self.entries
            .get(&ip)
            .filter(|slot| !self.is_stale(slot, now))
            .map(|slot| slot.mac)
    }

    /// Removes every entry past its TTL and returns what was removed.
    pub fn expire_stale(&mut self, now: Instant) -> Vec<ArpCacheEntry> {
        let stale: Vec<Ipv4Addr> = self
            .entries
            .iter()
            .filter(|(_, slot)| self.is_stale(slot, now))
            .map(|(ip, _)| *ip)
            .collect();

        let mut expired: Vec<ArpCacheEntry> = stale
            .into_iter()
            .filter_map(|ip| self.entries.remove(&ip).map(|slot| entry(ip, slot)))
            .collect();
        expired.sort_by_key(|entry| entry.ip);
        expired
    }

    /// Every entry, stale or not, ordered by address.
    pub fn entries(&self) -> Vec<ArpCacheEntry> {
        let mut entries: Vec<ArpCacheEntry> = self
            .entries
            .iter()
            .map(|(ip, slot)| entry(*ip, *slot))
            .collect();
        entries.sort_by_key(|entry| entry.ip);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_stale(&self, slot: &Slot, now: Instant) -> bool {
        now.saturating_duration_since(slot.learned_at) > self.ttl
    }

    fn evict_oldest(&mut self) -> Option<ArpCacheEntry> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| (slot.learned_at, slot.seq))
            .map(|(ip, _)| *ip)?;
        self.entries.remove(&oldest).map(|slot| entry(oldest, slot))
    }
}

fn entry(ip: Ipv4Addr, slot: Slot) -> ArpCacheEntry {
    ArpCacheEntry {
        ip,
        mac: slot.mac,
        learned_at: slot.learned_at,
    }
}

impl fmt::Display for ArpCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "---- ARP CACHE ({}/{}) ----", self.len(), self.capacity)?;
        for entry in self.entries() {
            writeln!(
                f,
                "{:<15} {}  age {:?}",
                entry.ip.to_string(),
                entry.mac,
                entry.learned_at.elapsed()
            )?;
        }
        Ok(())
    }
}
