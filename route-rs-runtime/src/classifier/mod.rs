//! # What are they for?
//!
//! Classifiers are very similar to processors, but are used to differentiate a stream of packets. As such, they take each packet by reference,
//! and are not able to modify it. Classifiers are able to return any type, but generally return an Enum
//! that tells the caller which group each packet belongs to, and therefore which path it takes next.
mod arp_op;
pub use self::arp_op::*;

/// Used to determine the kind of packet we have. Classifier::Class is then consumed by whoever
/// owns the stream to send the packet down the appropriate path.
pub trait Classifier {
    type Packet: Send + Clone;
    type Class: Sized;

    fn classify(&self, packet: &Self::Packet) -> Self::Class;
}
