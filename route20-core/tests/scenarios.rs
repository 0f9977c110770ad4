//! End-to-end scenarios driving whole [`RouterState`] instances against
//! each other, one per handler call, with no event loop or real datalink:
//! each test plays the role the event loop normally would, taking the
//! `RouterAction::Transmit` packets one state's handlers return and
//! feeding them into another state's `handle_frame`.

use route20_core::address::Address;
use route20_core::circuit::{Circuit, CircuitKindState, Datalink, PointToPointHandshake};
use route20_core::node::{RouterAction, RouterState};
use route20_core::timer::TimerPurpose;
use route20_core::wire::hello::RouterHello;
use route20_core::wire::init::NodeType;
use route20_core::wire::routing_msg::{RoutingEntry, RoutingMessage};
use route20_core::wire::{self, Message};

#[derive(Debug, Default)]
struct NullDatalink;

impl Datalink for NullDatalink {
    fn open(&mut self) -> bool {
        true
    }
    fn start(&mut self) -> bool {
        true
    }
    fn read_packet(&mut self) -> Option<Vec<u8>> {
        None
    }
    fn write_packet(&mut self, _to: Option<Address>, _packet: &[u8], _is_hello: bool) -> bool {
        true
    }
    fn close(&mut self) {}
}

fn addr(area: u8, node: u16) -> Address {
    Address::new(area, node).unwrap()
}

fn ethernet(slot: u16, cost: u16, local: Address) -> Circuit {
    Circuit::new_ethernet(slot, format!("eth-{}", slot), cost, local, Box::new(NullDatalink)).unwrap()
}

fn ddcmp(slot: u16, cost: u16, local: Address) -> Circuit {
    Circuit::new_ddcmp(slot, format!("ddcmp-{}", slot), cost, local, Box::new(NullDatalink)).unwrap()
}

fn only_transmit(actions: &[RouterAction]) -> (&[u8], Option<u16>) {
    for a in actions {
        if let RouterAction::Transmit { packet, circuit_slot, .. } = a {
            return (packet, Some(*circuit_slot));
        }
    }
    (&[], None)
}

/// Two Ethernet-attached nodes in the same area elect the lower-numbered
/// node as designated router and then learn each other's Level 1 route.
#[test]
fn two_node_ethernet_dr_election_and_reachability() {
    let a_addr = addr(1, 10);
    let b_addr = addr(1, 20);

    let mut a = RouterState::new(a_addr, false, 64);
    a.add_circuit(ethernet(1, 4, a_addr), 0);
    a.start_all_circuits(0).unwrap();

    let mut b = RouterState::new(b_addr, false, 64);
    b.add_circuit(ethernet(1, 4, b_addr), 0);
    b.start_all_circuits(0).unwrap();

    let hello_from = |id: Address| RouterHello {
        id,
        node_type: NodeType::Level1Router,
        blksize: 1498,
        priority: 64,
        area: 1,
        timer: 180,
        neighbors: vec![],
    };

    a.handle_frame(1, &wire::encode(&Message::RouterHello(hello_from(b_addr))), 0);
    b.handle_frame(1, &wire::encode(&Message::RouterHello(hello_from(a_addr))), 0);

    a.handle_timer(TimerPurpose::DrDelayExpiry { circuit_slot: 1 }, 5);
    b.handle_timer(TimerPurpose::DrDelayExpiry { circuit_slot: 1 }, 5);

    let a_is_dr = matches!(
        a.circuits[&1].kind_state,
        CircuitKindState::Ethernet { designated_router: true, .. }
    );
    let b_is_dr = matches!(
        b.circuits[&1].kind_state,
        CircuitKindState::Ethernet { designated_router: true, .. }
    );
    assert!(a_is_dr, "lower node number should win the DR tie-break");
    assert!(!b_is_dr);

    let msg_for_b = RoutingMessage {
        srcnode: 10,
        startid: 10,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }],
    };
    b.handle_frame(1, &wire::encode(&Message::Level1Routing(msg_for_b)), 0);
    assert_eq!(b.l1.mincost(10), 4);
    assert_eq!(b.l1.minhop(10), 1);

    let msg_for_a = RoutingMessage {
        srcnode: 20,
        startid: 20,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }],
    };
    a.handle_frame(1, &wire::encode(&Message::Level1Routing(msg_for_a)), 0);
    assert_eq!(a.l1.mincost(20), 4);
    assert_eq!(a.l1.minhop(20), 1);
}

/// A-B-C DDCMP line: the handshake completes on both links, and a route
/// to C learned by B is re-advertised to A with the accumulated cost.
#[test]
fn three_node_ddcmp_line_forwards_routes() {
    let a_addr = addr(1, 10);
    let b_addr = addr(1, 20);
    let c_addr = addr(1, 30);

    let mut a = RouterState::new(a_addr, false, 64);
    a.add_circuit(ddcmp(1, 3, a_addr), 0);
    let a_start = a.start_all_circuits(0).unwrap();

    let mut b = RouterState::new(b_addr, false, 64);
    b.add_circuit(ddcmp(1, 3, b_addr), 0);
    b.add_circuit(ddcmp(2, 5, b_addr), 0);
    let b_start = b.start_all_circuits(0).unwrap();

    let mut c = RouterState::new(c_addr, false, 64);
    c.add_circuit(ddcmp(1, 5, c_addr), 0);
    let c_start = c.start_all_circuits(0).unwrap();

    // A <-> B handshake (A's slot 1, B's slot 1).
    let (a_init, _) = only_transmit(&a_start);
    let b_init_to_a = b_start
        .iter()
        .find_map(|act| match act {
            RouterAction::Transmit { circuit_slot: 1, packet, .. } => Some(packet.clone()),
            _ => None,
        })
        .expect("B sends an Initialization on its circuit to A");
    b.handle_frame(1, a_init, 0);
    a.handle_frame(1, &b_init_to_a, 0);

    // B <-> C handshake (B's slot 2, C's slot 1). `b_start` holds one
    // SendInitialization action per DDCMP circuit, in slot order.
    let b_init_to_c = b_start
        .iter()
        .find_map(|act| match act {
            RouterAction::Transmit { circuit_slot: 2, packet, .. } => Some(packet.clone()),
            _ => None,
        })
        .expect("B sends an Initialization on its circuit to C");
    let (c_init, _) = only_transmit(&c_start);
    c.handle_frame(1, &b_init_to_c, 0);
    b.handle_frame(2, c_init, 0);

    let running = |c: &RouterState, slot: u16| match c.circuits[&slot].kind_state {
        CircuitKindState::Ddcmp { handshake, .. } => handshake == PointToPointHandshake::Running,
        _ => false,
    };
    assert!(running(&a, 1));
    assert!(running(&b, 1));
    assert!(running(&b, 2));
    assert!(running(&c, 1));

    // C tells B it is directly reachable.
    let c_route = RoutingMessage {
        srcnode: 30,
        startid: 30,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }],
    };
    b.handle_frame(2, &wire::encode(&Message::Level1Routing(c_route)), 0);
    assert_eq!(b.l1.mincost(30), 5);
    assert_eq!(b.l1.minhop(30), 1);

    // B re-advertises on its full periodic update to A; find the batch
    // containing node 30 and feed it to A.
    let b_update = b.handle_timer(TimerPurpose::FullUpdateL1 { circuit_slot: 1 }, 1);
    let batch = b_update
        .iter()
        .find_map(|act| match act {
            RouterAction::Transmit { packet, .. } => match wire::decode(packet) {
                Ok(Message::Level1Routing(m)) if (m.startid..m.startid + m.entries.len() as u16).contains(&30) => {
                    Some(packet.clone())
                }
                _ => None,
            },
            _ => None,
        })
        .expect("B's full update includes the batch containing node 30");
    a.handle_frame(1, &batch, 1);

    assert_eq!(a.l1.mincost(30), 3 + 5);
    assert_eq!(a.l1.minhop(30), 2);
}

/// Dropping the circuit a route was learned on withdraws it (poisons it to
/// infinite cost/hop) on the node's other circuits.
#[test]
fn circuit_down_withdraws_learned_route() {
    let b_addr = addr(1, 20);
    let a_addr = addr(1, 10);
    let c_addr = addr(1, 30);

    let mut b = RouterState::new(b_addr, false, 64);
    b.add_circuit(ethernet(1, 4, b_addr), 0);
    b.add_circuit(ethernet(2, 4, b_addr), 0);
    b.start_all_circuits(0).unwrap();

    let hello = |id: Address| RouterHello {
        id,
        node_type: NodeType::Level1Router,
        blksize: 1498,
        priority: 64,
        area: 1,
        timer: 180,
        neighbors: vec![],
    };
    b.handle_frame(1, &wire::encode(&Message::RouterHello(hello(a_addr))), 0);
    b.handle_frame(2, &wire::encode(&Message::RouterHello(hello(c_addr))), 0);

    let route_to_99 = RoutingMessage {
        srcnode: 30,
        startid: 90,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }, RoutingEntry { hops: 0, cost: 0 }],
    };
    b.handle_frame(2, &wire::encode(&Message::Level1Routing(route_to_99)), 0);
    assert!(b.l1.is_reachable(91));
    assert_eq!(b.l1.mincost(91), 4);

    // Drain the Srm bits the route-learning step set, so the only pending
    // advertisement left after the drop is the withdrawal itself.
    let _ = b.flush_pending_updates(0);

    b.circuit_down(2);
    assert!(!b.l1.is_reachable(91));

    // A tick past T2_SECS so the withdrawal isn't held back by the
    // per-circuit rate limit.
    let withdrawal = b.flush_pending_updates(route20_core::constants::T2_SECS);
    let saw_withdrawal = withdrawal.iter().any(|act| match act {
        RouterAction::Transmit { circuit_slot: 1, packet, .. } => match wire::decode(packet) {
            Ok(Message::Level1Routing(m)) => {
                let idx = 91i32 - m.startid as i32;
                idx >= 0
                    && (idx as usize) < m.entries.len()
                    && m.entries[idx as usize].cost == route20_core::constants::INFC
                    && m.entries[idx as usize].hops == route20_core::constants::INFH
            }
            _ => false,
        },
        _ => false,
    });
    assert!(saw_withdrawal, "node 91 should be withdrawn on circuit 1 after circuit 2 drops");
}

/// A Level 2 router learns an inter-area route from a neighboring Level 2
/// router and loses it again when that adjacency's circuit drops.
#[test]
fn level2_area_reachability_tracks_adjacency() {
    let d_addr = addr(1, 10);
    let r_addr = addr(1, 20);

    let mut d = RouterState::new(d_addr, true, 64);
    d.add_circuit(ddcmp(1, 5, d_addr), 0);
    let start = d.start_all_circuits(0).unwrap();
    let (d_init, _) = only_transmit(&start);
    assert!(!d_init.is_empty());

    let peer_init = route20_core::wire::init::Initialization {
        srcnode: r_addr.node(),
        node_type: NodeType::Level2Router,
        blksize: 1498,
        timer: 10,
    };
    d.handle_frame(1, &wire::encode(&Message::Initialization(peer_init)), 0);
    assert!(d.l2.attached());
    assert!(!d.is_area_reachable(5));

    let l2_route = RoutingMessage {
        srcnode: r_addr.node(),
        startid: 5,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }],
    };
    d.handle_frame(1, &wire::encode(&Message::Level2Routing(l2_route)), 0);
    assert!(d.is_area_reachable(5));
    assert_eq!(d.l2.mincost(5), 5);

    d.circuit_down(1);
    assert!(!d.is_area_reachable(5));
    assert!(!d.l2.attached());
}

/// A data packet that has already visited `MAXV` circuits is dropped
/// rather than forwarded once more.
#[test]
fn loop_elimination_drops_overvisited_packet() {
    let local = addr(1, 10);
    let mut state = RouterState::new(local, false, 64);
    state.add_circuit(ethernet(1, 4, local), 0);

    let route = RoutingMessage {
        srcnode: 20,
        startid: 20,
        entries: vec![RoutingEntry { hops: 0, cost: 0 }],
    };
    state.handle_frame(1, &wire::encode(&Message::Level1Routing(route)), 0);

    let packet = route20_core::wire::data::ShortDataPacket {
        dstnode: 20,
        srcnode: 99,
        visits: route20_core::constants::MAXV,
        payload: vec![1, 2, 3],
    };
    let actions = state.handle_frame(1, &wire::encode(&Message::ShortData(packet)), 0);
    assert!(actions.is_empty(), "an over-visited packet must be dropped silently");
}

/// A node's first full Level 1 update always puts its own batch first, so
/// a freshly-joined peer learns about it within the first message it
/// receives rather than waiting a full scan cycle.
#[test]
fn full_update_places_local_node_in_first_batch() {
    let local = addr(1, 50);
    let mut state = RouterState::new(local, false, 64);
    state.add_circuit(ethernet(1, 4, local), 0);

    let actions = state.handle_timer(TimerPurpose::FullUpdateL1 { circuit_slot: 1 }, 0);
    let first = actions
        .first()
        .expect("a full update produces at least one message");
    let packet = match first {
        RouterAction::Transmit { packet, .. } => packet,
        other => panic!("expected a transmit action, got {:?}", other),
    };
    let msg = match wire::decode(packet).unwrap() {
        Message::Level1Routing(m) => m,
        other => panic!("expected a Level 1 routing message, got {:?}", other),
    };
    assert!((msg.startid..msg.startid + msg.entries.len() as u16).contains(&50));
    let idx = (50 - msg.startid) as usize;
    assert_eq!(msg.entries[idx].hops, 0);
    assert_eq!(msg.entries[idx].cost, 0);
}
