extern crate crossbeam;
extern crate tokio;

/// Classifiers sort packets into classes, so that a router can branch on them. The ARP core uses one
/// to split inbound frames into requests, replies, and frames it has no business with.
pub mod classifier;

/// Tunables for the cache, the pending resolution queue, and the maintenance loop.
pub mod config;

/// The dispatcher ties the ARP core together. It owns the cache and the pending resolution queue,
/// answers requests for the router's own addresses, learns from replies, holds outbound packets
/// while their next hop is resolved, and retries or gives up on silent hosts.
pub mod dispatcher;

pub mod error;

/// The router's interface table, and the primitive used to put frames on the wire.
pub mod interface;

/// Processors are the unit of transformation in route-rs. A processor is handed one packet at a
/// time and either emits a packet (not necessarily of the same type) or drops it. The ARP core
/// provides one that builds requests and one that feeds inbound frames to a dispatcher.
pub mod processor;

/// State tables owned by the dispatcher: the ARP cache and the pending resolution queue.
pub mod state;

/// Hooks for observing what the ARP core does, through tracing or counters.
pub mod telemetry;

/// Helpers for running the ARP core inside a Tokio runtime.
pub mod utils;

pub use crate::config::ArpConfig;
pub use crate::dispatcher::{ArpDispatcher, Dispatch, MaintenanceReport, Resolution};
pub use crate::error::ArpError;
