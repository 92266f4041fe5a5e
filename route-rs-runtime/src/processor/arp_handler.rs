use crate::dispatcher::{ArpDispatcher, Dispatch};
use crate::interface::{InterfaceAnnotated, InterfaceTable, Transmit};
use crate::processor::Processor;
use crate::telemetry::ArpTelemetry;
use route_rs_packets::EthernetFrame;
use std::sync::Arc;
use std::time::Instant;

/// Feeds inbound frames into a shared `ArpDispatcher`, so ARP handling can sit in a processor
/// chain. Malformed frames are filtered out; everything else comes out as the dispatch result.
pub struct ArpHandler<T: Transmit, I: InterfaceTable, N: ArpTelemetry> {
    dispatcher: Arc<ArpDispatcher<T, I, N>>,
}

impl<T: Transmit, I: InterfaceTable, N: ArpTelemetry> ArpHandler<T, I, N> {
    pub fn new(dispatcher: Arc<ArpDispatcher<T, I, N>>) -> Self {
        ArpHandler { dispatcher }
    }
}

impl<T: Transmit, I: InterfaceTable, N: ArpTelemetry> Processor for ArpHandler<T, I, N> {
    type Input = InterfaceAnnotated<EthernetFrame>;
    type Output = Dispatch;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output> {
        match self
            .dispatcher
            .dispatch_frame(&packet.packet, &packet.interface, Instant::now())
        {
            Dispatch::Malformed(_) => None,
            dispatch => Some(dispatch),
        }
    }
}
