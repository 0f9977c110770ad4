//! Property-based round-trip coverage for the wire codecs (C1), beyond the
//! fixed-example tests each codec module keeps next to its `encode`/`decode`
//! pair: every value drawn from the architectural ranges in
//! [`route20_core::constants`] must survive an encode/decode cycle intact.

use proptest::prelude::*;
use route20_core::address::Address;
use route20_core::constants::{INFC, INFH, MAXC, MAXH, NA, NN};
use route20_core::wire::data::{LongDataPacket, ShortDataPacket};
use route20_core::wire::hello::{AdjacencySummary, EndnodeHello, RouterHello};
use route20_core::wire::init::{Initialization, NodeType};
use route20_core::wire::routing_msg::{RoutingEntry, RoutingMessage};
use route20_core::wire::verification::Verification;
use route20_core::wire::ControlFlags;

fn arb_address() -> impl Strategy<Value = Address> {
    (1..=NA, 1..=NN).prop_map(|(area, node)| Address::new(area, node).unwrap())
}

fn arb_node_type() -> impl Strategy<Value = NodeType> {
    prop_oneof![Just(NodeType::Level1Router), Just(NodeType::Level2Router)]
}

fn arb_routing_entry() -> impl Strategy<Value = RoutingEntry> {
    prop_oneof![
        Just(RoutingEntry { hops: INFH, cost: INFC }),
        (0..=MAXH, 0..=MAXC).prop_map(|(hops, cost)| RoutingEntry { hops, cost }),
    ]
}

proptest! {
    #[test]
    fn short_data_packet_round_trips(
        dstnode in 1..=NN,
        srcnode in 1..=NN,
        visits in 0u8..=31,
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let m = ShortDataPacket { dstnode, srcnode, visits, payload };
        prop_assert_eq!(ShortDataPacket::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn long_data_packet_round_trips(
        dst in arb_address(),
        src in arb_address(),
        service_class in any::<u8>(),
        protocol_type in any::<u8>(),
        visits in 0u8..=31,
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let m = LongDataPacket { dst, src, service_class, protocol_type, visits, payload };
        prop_assert_eq!(LongDataPacket::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn initialization_round_trips(
        srcnode in 1..=NN,
        node_type in arb_node_type(),
        blksize in any::<u16>(),
        timer in any::<u16>(),
    ) {
        let m = Initialization { srcnode, node_type, blksize, timer };
        prop_assert_eq!(Initialization::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn verification_round_trips(srcnode in 1..=NN, fcnval in any::<u16>()) {
        let m = Verification { srcnode, fcnval };
        prop_assert_eq!(Verification::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn endnode_hello_round_trips(
        id in arb_address(),
        blksize in any::<u16>(),
        area in 1..=NA,
        timer in any::<u16>(),
    ) {
        let m = EndnodeHello { id, blksize, area, timer };
        prop_assert_eq!(EndnodeHello::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn router_hello_round_trips(
        id in arb_address(),
        node_type in arb_node_type(),
        blksize in any::<u16>(),
        priority in any::<u8>(),
        area in 1..=NA,
        timer in any::<u16>(),
        neighbors in prop::collection::vec(
            (arb_address(), any::<u8>(), any::<bool>()).prop_map(|(router_id, priority, two_way)| {
                AdjacencySummary { router_id, priority: priority & 0x7F, two_way }
            }),
            0..5,
        ),
    ) {
        let m = RouterHello { id, node_type, blksize, priority, area, timer, neighbors };
        prop_assert_eq!(RouterHello::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn routing_message_round_trips(
        srcnode in 1..=NN,
        startid in any::<u16>(),
        entries in prop::collection::vec(arb_routing_entry(), 0..32),
    ) {
        let m = RoutingMessage { srcnode, startid, entries };
        let bytes = m.encode(ControlFlags::Level1Routing);
        prop_assert_eq!(RoutingMessage::decode(&bytes).unwrap(), m);
    }
}
