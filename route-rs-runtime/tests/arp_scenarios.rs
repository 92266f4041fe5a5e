use crossbeam::crossbeam_channel::{self, Receiver};
use maplit::hashmap;
use route_rs_packets::{ArpFrame, ArpMessage, ArpOp, EthernetFrame, MacAddr, IPV4_ETHER_TYPE};
use route_rs_runtime::interface::{ChannelTransmit, Interface, Outbound, StaticInterfaceTable};
use route_rs_runtime::telemetry::{ArpCounters, NoTelemetry, Tee};
use route_rs_runtime::{ArpConfig, ArpDispatcher, ArpError, Dispatch, Resolution};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type Router =
    ArpDispatcher<ChannelTransmit, StaticInterfaceTable, Tee<NoTelemetry, Arc<ArpCounters>>>;

fn eth0_mac() -> MacAddr {
    MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
}

fn host_mac() -> MacAddr {
    "AA:BB:CC:DD:EE:FF".parse().unwrap()
}

fn router(config: ArpConfig) -> (Router, Receiver<Outbound>, Arc<ArpCounters>) {
    let interfaces = StaticInterfaceTable::from(hashmap! {
        "eth0".to_string() => Interface::new("eth0", eth0_mac(), Ipv4Addr::new(10, 0, 0, 1)),
        "eth1".to_string() => Interface::new(
            "eth1",
            MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]),
            Ipv4Addr::new(192, 168, 1, 1),
        ),
    });
    let (s, r) = crossbeam_channel::unbounded();
    let counters = Arc::new(ArpCounters::new());
    let router = ArpDispatcher::new(interfaces, ChannelTransmit::new(s), config)
        .telemetry(Tee(NoTelemetry, counters.clone()));
    (router, r, counters)
}

fn decode_arp(out: &Outbound) -> (EthernetFrame, ArpMessage) {
    let frame = EthernetFrame::from_buffer(out.frame.clone(), 0).unwrap();
    let message = ArpFrame::try_from(frame.clone()).unwrap().message();
    (frame, message)
}

fn datagram(id: u8) -> EthernetFrame {
    let mut frame = EthernetFrame::empty();
    frame.set_ether_type(IPV4_ETHER_TYPE);
    frame.set_payload(&[0x45, 0x00, 0x00, 0x14, id]);
    frame
}

fn reply_from_host(now: Instant, router: &Router) -> Dispatch {
    let reply = ArpMessage::reply_to(
        &ArpMessage::request(eth0_mac(), Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 5)),
        host_mac(),
        Ipv4Addr::new(10, 0, 0, 5),
    );
    let frame = ArpFrame::new(&reply, host_mac(), eth0_mac()).frame();
    router.dispatch(frame.as_bytes(), "eth0", now)
}

#[test]
fn answers_request_for_own_address() {
    let (router, r, _) = router(ArpConfig::default());
    let requester_mac = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let request = ArpMessage::request(
        requester_mac,
        Ipv4Addr::new(10, 0, 0, 2),
        Ipv4Addr::new(10, 0, 0, 1),
    );
    let frame = ArpFrame::new(&request, requester_mac, MacAddr::BROADCAST).frame();

    router.dispatch(frame.as_bytes(), "eth0", Instant::now());

    let sent: Vec<Outbound> = r.try_iter().collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].interface, "eth0");
    let (frame, reply) = decode_arp(&sent[0]);
    assert_eq!(reply.opcode, ArpOp::Reply as u16);
    assert_eq!(reply.sender_mac, eth0_mac());
    assert_eq!(reply.sender_ip, Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(reply.target_mac, requester_mac);
    assert_eq!(reply.target_ip, Ipv4Addr::new(10, 0, 0, 2));
    assert_eq!(frame.dest_mac(), requester_mac);
    assert_eq!(frame.src_mac(), eth0_mac());
}

#[test]
fn reply_delivers_queued_packet() {
    let (router, r, counters) = router(ArpConfig::default());
    let now = Instant::now();
    let host = Ipv4Addr::new(10, 0, 0, 5);

    router.resolve_and_send(host, datagram(7), "eth0", now).unwrap();
    let (request_frame, request) = decode_arp(&r.try_recv().unwrap());
    assert_eq!(request_frame.dest_mac(), MacAddr::BROADCAST);
    assert_eq!(request.target_ip, host);

    match reply_from_host(now, &router) {
        Dispatch::Learned { released, errors, .. } => {
            assert_eq!(released, 1);
            assert!(errors.is_empty());
        }
        other => panic!("expected a learned mapping, got {:?}", other),
    }
    assert_eq!(router.lookup(host, now), Some(host_mac()));

    let out = r.try_recv().unwrap();
    assert_eq!(out.interface, "eth0");
    let delivered = EthernetFrame::from_buffer(out.frame, 0).unwrap();
    assert_eq!(delivered.dest_mac(), host_mac());
    assert_eq!(delivered.src_mac(), eth0_mac());
    assert_eq!(delivered.payload()[4], 7);
    assert!(r.is_empty());

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.requests_sent, 1);
    assert_eq!(snapshot.learned, 1);
}

#[test]
fn one_request_per_unresolved_address() {
    let (router, r, counters) = router(ArpConfig::default());
    let now = Instant::now();
    for id in 0..10 {
        router
            .resolve_and_send(Ipv4Addr::new(10, 0, 0, 5), datagram(id), "eth0", now)
            .unwrap();
    }
    assert_eq!(r.try_iter().count(), 1);
    assert_eq!(counters.snapshot().requests_sent, 1);
    assert_eq!(router.pending_count(), 1);
}

#[test]
fn released_packets_keep_their_order() {
    let (router, r, _) = router(ArpConfig::default());
    let now = Instant::now();
    for id in 0..5 {
        router
            .resolve_and_send(Ipv4Addr::new(10, 0, 0, 5), datagram(id), "eth0", now)
            .unwrap();
    }
    let _request = r.try_recv().unwrap();

    reply_from_host(now, &router);

    let order: Vec<u8> = r
        .try_iter()
        .map(|out| EthernetFrame::from_buffer(out.frame, 0).unwrap().payload()[4])
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn silent_host_is_unreachable_once() {
    let (router, r, counters) = router(ArpConfig::default());
    let start = Instant::now();
    let host = Ipv4Addr::new(10, 0, 0, 9);
    router.resolve_and_send(host, datagram(0), "eth0", start).unwrap();
    router.resolve_and_send(host, datagram(1), "eth0", start).unwrap();

    let mut errors = vec![];
    for second in 1..=20 {
        let report = router.maintain(start + Duration::from_secs(second));
        errors.extend(report.unreachable_errors());
    }

    assert_eq!(
        errors,
        vec![ArpError::UnreachableTarget {
            target: host,
            dropped: 2,
        }]
    );
    // max_attempts requests in total, and neither queued packet went out
    let sent: Vec<Outbound> = r.try_iter().collect();
    assert_eq!(sent.len(), 5);
    assert!(sent.iter().all(|out| decode_arp(out).1.is_request()));
    assert_eq!(counters.snapshot().unreachable, 1);
    assert_eq!(router.pending_count(), 0);
}

#[test]
fn cache_hit_skips_resolution() {
    let (router, r, _) = router(ArpConfig::default());
    let now = Instant::now();
    reply_from_host(now, &router);

    assert_eq!(
        router.resolve_and_send(Ipv4Addr::new(10, 0, 0, 5), datagram(1), "eth0", now),
        Ok(Resolution::Sent(host_mac()))
    );
    assert_eq!(r.try_iter().count(), 1);
    assert_eq!(router.pending_count(), 0);
}

#[test]
fn stale_mapping_is_resolved_again() {
    let (router, r, _) = router(ArpConfig::new().cache_ttl(Duration::from_secs(15)));
    let now = Instant::now();
    reply_from_host(now, &router);

    let later = now + Duration::from_secs(16);
    assert_eq!(router.lookup(Ipv4Addr::new(10, 0, 0, 5), later), None);
    match router.resolve_and_send(Ipv4Addr::new(10, 0, 0, 5), datagram(1), "eth0", later) {
        Ok(Resolution::Queued { .. }) => {}
        other => panic!("expected the packet to be queued, got {:?}", other),
    }
    let (_, request) = decode_arp(&r.try_recv().unwrap());
    assert!(request.is_request());
}

#[test]
fn full_cache_evicts_oldest() {
    let (router, _r, counters) = router(ArpConfig::new().cache_capacity(3));
    let now = Instant::now();
    for last in 1..=4u8 {
        let ip = Ipv4Addr::new(10, 0, 0, 100 + last);
        let mac = MacAddr::new([0xaa, 0, 0, 0, 0, last]);
        let reply = ArpMessage::reply_to(
            &ArpMessage::request(eth0_mac(), Ipv4Addr::new(10, 0, 0, 1), ip),
            mac,
            ip,
        );
        let frame = ArpFrame::new(&reply, mac, eth0_mac()).frame();
        router.dispatch(frame.as_bytes(), "eth0", now + Duration::from_millis(last as u64));
    }

    let cached: Vec<Ipv4Addr> = router.cache_snapshot().iter().map(|e| e.ip).collect();
    assert_eq!(
        cached,
        vec![
            Ipv4Addr::new(10, 0, 0, 102),
            Ipv4Addr::new(10, 0, 0, 103),
            Ipv4Addr::new(10, 0, 0, 104),
        ]
    );
    assert_eq!(counters.snapshot().evicted, 1);
}

#[test]
fn garbage_never_panics() {
    let (router, r, counters) = router(ArpConfig::default());
    let now = Instant::now();
    let mut truncated = ArpFrame::new(
        &ArpMessage::request(host_mac(), Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1)),
        host_mac(),
        MacAddr::BROADCAST,
    )
    .frame()
    .as_bytes()
    .to_vec();
    truncated.truncate(30);

    for bytes in &[vec![], vec![0xff; 13], truncated] {
        match router.dispatch(bytes, "eth0", now) {
            Dispatch::Malformed(_) => {}
            other => panic!("expected malformed, got {:?}", other),
        }
    }
    assert!(r.is_empty());
    assert_eq!(counters.snapshot().malformed, 3);
}

#[test]
fn shared_between_threads() {
    let (router, r, _) = router(ArpConfig::default());
    let router = Arc::new(router);
    let now = Instant::now();

    let senders: Vec<_> = (0..4u8)
        .map(|worker| {
            let router = router.clone();
            thread::spawn(move || {
                for id in 0..8u8 {
                    router
                        .resolve_and_send(
                            Ipv4Addr::new(10, 0, 0, 5),
                            datagram(worker * 8 + id),
                            "eth0",
                            now,
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for sender in senders {
        sender.join().unwrap();
    }

    reply_from_host(now, &router);

    let sent: Vec<Outbound> = r.try_iter().collect();
    // one request, then all 32 packets
    assert_eq!(sent.len(), 33);
    assert_eq!(router.pending_count(), 0);
}
