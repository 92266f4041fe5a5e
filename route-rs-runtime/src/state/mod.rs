//! State that outlives a single packet. Each structure here is plain data with no locking of
//! its own; the dispatcher decides how it is shared.
mod arp_cache;
pub use self::arp_cache::*;

mod pending_queue;
pub use self::pending_queue::*;
