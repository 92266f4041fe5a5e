mod arp_generator;
pub use self::arp_generator::*;

mod arp_handler;
pub use self::arp_handler::*;

/// A unit of per-packet work. `process` consumes a packet and optionally produces one; returning
/// `None` filters the packet out of the stream.
pub trait Processor {
    type Input: Send + Clone;
    type Output: Send + Clone;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output>;
}
