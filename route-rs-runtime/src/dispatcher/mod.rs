//! The ARP state machine.
//!
//! From the ARP RFC: https://tools.ietf.org/html/rfc826
//!
//! ?Do I have the hardware type in ar$hrd?
//! Yes:
//!     ?Do I speak the protocol in ar$pro?
//!     Yes:
//!         ?Is the opcode ares_op$REQUEST?
//!         Yes:
//!             ?Am I the target protocol address?
//!             Yes:
//!                 Swap hardware and protocol fields, putting the local hardware and protocol
//!                     addresses in the sender fields.
//!                 Set the ar$op field to ares_op$REPLY
//!                 Send the packet to the (new) target hardware address on the same hardware on
//!                     which the request was received.
//!         ?Is the opcode ares_op$REPLY?
//!         Yes:
//!             Add or refresh <sender protocol address, sender hardware address> in the cache,
//!             then send everything that was waiting on that address.
//!
//! Unlike the RFC, requests never update the cache; only replies teach us mappings.
use crate::classifier::{ArpClass, ArpOpClassifier};
use crate::config::ArpConfig;
use crate::error::ArpError;
use crate::interface::{Interface, InterfaceTable, Transmit, TransmitError};
use crate::processor::ArpRequestBuilder;
use crate::state::{
    ArpCache, ArpCacheEntry, Enqueued, PendingPacket, PendingResolutionQueue, TickOutcome,
};
use crate::telemetry::{ArpTelemetry, TracingTelemetry};
use route_rs_packets::{ArpFrame, ArpMessage, EthernetFrame, MacAddr};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{instrument, trace};

mod outcome;
pub use self::outcome::*;

/// Owns the ARP cache and the pending resolution queue, and is the only thing that mutates
/// them. Every method takes `&self`, so one dispatcher can be shared through an `Arc` between
/// the threads receiving frames and the maintenance loop.
///
/// Locks are always taken pending queue first, then cache, and are never held across a call
/// to the transmit primitive.
pub struct ArpDispatcher<T: Transmit, I: InterfaceTable, N: ArpTelemetry = TracingTelemetry> {
    interfaces: I,
    transmit: T,
    telemetry: N,
    classifier: ArpOpClassifier,
    config: ArpConfig,
    pending: Mutex<PendingResolutionQueue>,
    cache: Mutex<ArpCache>,
}

impl<T: Transmit, I: InterfaceTable> ArpDispatcher<T, I, TracingTelemetry> {
    pub fn new(interfaces: I, transmit: T, config: ArpConfig) -> Self {
        ArpDispatcher {
            interfaces,
            transmit,
            telemetry: TracingTelemetry,
            classifier: ArpOpClassifier::new(),
            pending: Mutex::new(PendingResolutionQueue::new(
                config.retry_interval,
                config.max_attempts,
                config.queue_cap,
            )),
            cache: Mutex::new(ArpCache::new(config.cache_capacity, config.cache_ttl)),
            config,
        }
    }
}

impl<T: Transmit, I: InterfaceTable, N: ArpTelemetry> ArpDispatcher<T, I, N> {
    /// Swaps the telemetry sink, which defaults to `TracingTelemetry`.
    pub fn telemetry<M: ArpTelemetry>(self, telemetry: M) -> ArpDispatcher<T, I, M> {
        ArpDispatcher {
            interfaces: self.interfaces,
            transmit: self.transmit,
            telemetry,
            classifier: self.classifier,
            config: self.config,
            pending: self.pending,
            cache: self.cache,
        }
    }

    pub fn config(&self) -> &ArpConfig {
        &self.config
    }

    /// Handles a frame received on `interface`, given as raw bytes from the wire.
    pub fn dispatch(&self, bytes: &[u8], interface: &str, now: Instant) -> Dispatch {
        match EthernetFrame::from_buffer(bytes.to_vec(), 0) {
            Ok(frame) => self.dispatch_frame(&frame, interface, now),
            Err(err) => {
                self.telemetry.malformed(interface, &err);
                Dispatch::Malformed(err)
            }
        }
    }

    #[instrument(skip(self, frame))]
    pub fn dispatch_frame(&self, frame: &EthernetFrame, interface: &str, now: Instant) -> Dispatch {
        trace!("{}", frame.header());
        let (class, message) = match self.classifier.decode(frame) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.telemetry.malformed(interface, &err);
                return Dispatch::Malformed(err);
            }
        };
        self.telemetry.classified(interface, class);

        match (class, message) {
            (ArpClass::Request, Some(request)) => self.answer(&request, interface),
            (ArpClass::Reply, Some(reply)) => self.learn(&reply, now),
            (class, _) => Dispatch::Ignored(class),
        }
    }

    /// Sends `frame` to `next_hop` out of `interface`, resolving the next hop's hardware address
    /// first if it isn't cached. Unresolved packets are held and a broadcast request goes out
    /// for the first of them.
    #[instrument(skip(self, frame))]
    pub fn resolve_and_send(
        &self,
        next_hop: Ipv4Addr,
        mut frame: EthernetFrame,
        interface: &str,
        now: Instant,
    ) -> Result<Resolution, ArpError> {
        let egress = self
            .interfaces
            .lookup_by_name(interface)
            .ok_or_else(|| ArpError::UnknownInterface(interface.to_string()))?;

        let mut pending = lock(&self.pending);
        let cached = lock(&self.cache).lookup(next_hop, now);
        if let Some(mac) = cached {
            drop(pending);
            frame.set_src_mac(egress.mac);
            frame.set_dest_mac(mac);
            self.send(&frame, interface)?;
            return Ok(Resolution::Sent(mac));
        }
        let enqueued = pending.enqueue(next_hop, frame, interface, now);
        drop(pending);

        match enqueued {
            Enqueued::NewRequest { .. } => {
                let request = match self.send_request(next_hop, &egress, 1) {
                    Ok(()) => RequestStatus::Sent,
                    Err(err) => RequestStatus::Failed(err),
                };
                Ok(Resolution::Queued {
                    request,
                    overflowed: false,
                })
            }
            Enqueued::Queued { overflowed } => {
                if let Some(dropped) = &overflowed {
                    self.telemetry.queue_overflow(next_hop, dropped);
                }
                Ok(Resolution::Queued {
                    request: RequestStatus::Outstanding,
                    overflowed: overflowed.is_some(),
                })
            }
        }
    }

    /// One maintenance pass: sweeps stale cache entries, re-requests addresses whose retry
    /// interval has passed, and gives up on those out of attempts.
    pub fn maintain(&self, now: Instant) -> MaintenanceReport {
        let expired = lock(&self.cache).expire_stale(now);
        for entry in &expired {
            self.telemetry.cache_expired(entry);
        }

        let TickOutcome {
            retries,
            unreachable,
        } = lock(&self.pending).tick(now);

        let mut errors = vec![];
        for retry in &retries {
            match self.interfaces.lookup_by_name(&retry.interface) {
                Some(egress) => {
                    if let Err(err) = self.send_request(retry.target_ip, &egress, retry.attempt) {
                        errors.push(err.into());
                    }
                }
                None => errors.push(ArpError::UnknownInterface(retry.interface.clone())),
            }
        }
        for target in &unreachable {
            self.telemetry.unreachable(target);
        }

        MaintenanceReport {
            expired,
            retried: retries,
            unreachable,
            errors,
        }
    }

    /// The cached address for `ip`, if there is one still within its TTL.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        lock(&self.cache).lookup(ip, now)
    }

    pub fn cache_snapshot(&self) -> Vec<ArpCacheEntry> {
        lock(&self.cache).entries()
    }

    /// The cache rendered as a table, for operators.
    pub fn cache_dump(&self) -> String {
        lock(&self.cache).to_string()
    }

    pub fn is_pending(&self, ip: Ipv4Addr) -> bool {
        lock(&self.pending).is_pending(ip)
    }

    /// Number of addresses currently being resolved.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    fn answer(&self, request: &ArpMessage, interface: &str) -> Dispatch {
        let own = match self.interfaces.lookup_by_ip(request.target_ip) {
            Some(own) => own,
            None => return Dispatch::Ignored(ArpClass::Request),
        };

        let reply = ArpMessage::reply_to(request, own.mac, own.ip);
        let frame = ArpFrame::new(&reply, own.mac, request.sender_mac).frame();
        let sent = self.send(&frame, interface);
        if sent.is_ok() {
            self.telemetry
                .replied(interface, request.sender_ip, request.target_ip);
        }
        Dispatch::Replied {
            answered_for: own.ip,
            sent,
        }
    }

    fn learn(&self, reply: &ArpMessage, now: Instant) -> Dispatch {
        let (inserted, released) = {
            let mut pending = lock(&self.pending);
            let inserted = lock(&self.cache).insert(reply.sender_ip, reply.sender_mac, now);
            (inserted, pending.resolve(reply.sender_ip))
        };
        self.telemetry
            .cache_inserted(reply.sender_ip, reply.sender_mac, &inserted);

        let count = released.len();
        let errors = released
            .into_iter()
            .filter_map(|packet| self.release(packet, reply.sender_mac).err())
            .collect();

        Dispatch::Learned {
            ip: reply.sender_ip,
            mac: reply.sender_mac,
            released: count,
            errors,
        }
    }

    fn release(&self, packet: PendingPacket, mac: MacAddr) -> Result<(), ArpError> {
        let PendingPacket {
            mut frame,
            interface,
        } = packet;
        let egress = self
            .interfaces
            .lookup_by_name(&interface)
            .ok_or_else(|| ArpError::UnknownInterface(interface.clone()))?;
        frame.set_src_mac(egress.mac);
        frame.set_dest_mac(mac);
        self.send(&frame, &interface)?;
        Ok(())
    }

    fn send_request(
        &self,
        target: Ipv4Addr,
        egress: &Interface,
        attempt: u32,
    ) -> Result<(), TransmitError> {
        let frame = ArpRequestBuilder::build(egress.mac, egress.ip, target);
        self.send(&frame, &egress.name)?;
        self.telemetry.request_sent(target, &egress.name, attempt);
        Ok(())
    }

    fn send(&self, frame: &EthernetFrame, interface: &str) -> Result<(), TransmitError> {
        self.transmit
            .send(frame.as_bytes(), interface)
            .map_err(|err| {
                self.telemetry.transmit_failed(&err);
                err
            })
    }
}

// Every mutation leaves the cache and queue consistent, so a panic elsewhere while holding a
// lock doesn't make the data unusable.
fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
