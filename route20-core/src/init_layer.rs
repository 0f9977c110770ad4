// Route20: a DECnet Phase IV routing engine
// Copyright (C) 2021  Route20 contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Init sub-layer (C4): neighbor discovery, the point-to-point three-way
//! handshake, and Ethernet designated-router election.

use crate::address::Address;
use crate::adjacency::Adjacency;
use crate::circuit::PointToPointHandshake;
use crate::wire::init::{Initialization, NodeType};
use crate::wire::verification::Verification;

/// Decide whether the local node is a designated-router candidate on a
/// circuit, given its router adjacencies in the local area (§4.4).
///
/// The local node is a candidate iff every such peer either has strictly
/// lower priority, or has equal priority and a strictly higher node number
/// (ties broken toward the lowest node id). This is the literal fold used
/// by the reference implementation's designated-router check.
pub fn is_dr_candidate<'a>(
    local: Address,
    local_priority: u8,
    peers: impl Iterator<Item = &'a Adjacency>,
) -> bool {
    for peer in peers {
        if peer.id == local {
            continue;
        }
        if peer.priority > local_priority {
            return false;
        }
        if peer.priority == local_priority && peer.id.node() < local.node() {
            return false;
        }
    }
    true
}

/// Inputs to the designated-router flip decision (§4.4): flip only once
/// `DRDELAY` has elapsed since the circuit started, and only if candidacy
/// actually differs from the current flag.
pub fn should_flip_dr(
    drdelay_elapsed: bool,
    candidate: bool,
    currently_dr: bool,
) -> bool {
    drdelay_elapsed && candidate != currently_dr
}

/// Point-to-point handshake events (C4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PpEvent {
    /// The circuit was just started; begin the handshake.
    Start,
    /// Peer's Initialization arrived.
    InitializationReceived(Initialization),
    /// Peer's Verification arrived.
    VerificationReceived(Verification),
    /// A hello/test message arrived while already `Running`.
    HelloReceived,
    /// Anything else arrived in a state that doesn't expect it.
    Unexpected,
}

/// What the caller should do in response to a handshake transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PpAction {
    /// Send our own Initialization.
    SendInitialization,
    /// Send our own Verification.
    SendVerification,
    /// Refresh the adjacency's listener timer; nothing to send.
    RefreshListener,
    /// Call `Circuit::reject` and restart the handshake from `Halted`.
    Reject,
    /// Nothing to do.
    None,
}

/// Drive the point-to-point handshake state machine (§4.4, §4.11):
/// `Halted -> Initialized -> [VerificationSent] -> Running`. Any unexpected
/// message in any state transitions to `Halted` with a reject.
pub fn handle_pp_event(
    state: PointToPointHandshake,
    event: PpEvent,
    verification_required: bool,
) -> (PointToPointHandshake, PpAction) {
    use PointToPointHandshake::*;
    match (state, event) {
        (Halted, PpEvent::Start) => (Initialized, PpAction::SendInitialization),
        (Initialized, PpEvent::InitializationReceived(_)) => {
            if verification_required {
                (VerificationSent, PpAction::SendVerification)
            } else {
                (Running, PpAction::None)
            }
        }
        (VerificationSent, PpEvent::VerificationReceived(_)) => (Running, PpAction::None),
        (Running, PpEvent::HelloReceived) => (Running, PpAction::RefreshListener),
        (_, PpEvent::Unexpected) => (Halted, PpAction::Reject),
        (other, _) => (other, PpAction::Reject),
    }
}

/// Node type to advertise in our own Initialization, derived from routing
/// level.
pub fn local_node_type(is_level2: bool) -> NodeType {
    if is_level2 {
        NodeType::Level2Router
    } else {
        NodeType::Level1Router
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::adjacency::AdjacencyKind;

    fn adj(node: u16, priority: u8) -> Adjacency {
        Adjacency {
            circuit_slot: 1,
            id: Address::new(1, node).unwrap(),
            priority,
            kind: AdjacencyKind::Level1Router,
            last_heard_from: 0,
            listener_timer: 540,
        }
    }

    #[test]
    fn lowest_node_wins_tie() {
        let local = Address::new(1, 10).unwrap();
        // Scenario 1 from the end-to-end tests: A=(1,10) prio 64, B=(1,20) prio 64.
        assert!(is_dr_candidate(local, 64, [adj(20, 64)].iter()));
        let local_b = Address::new(1, 20).unwrap();
        assert!(!is_dr_candidate(local_b, 64, [adj(10, 64)].iter()));
    }

    #[test]
    fn higher_priority_peer_blocks_candidacy() {
        let local = Address::new(1, 10).unwrap();
        assert!(!is_dr_candidate(local, 32, [adj(20, 64)].iter()));
    }

    #[test]
    fn lower_priority_peer_does_not_block() {
        let local = Address::new(1, 10).unwrap();
        assert!(is_dr_candidate(local, 64, [adj(20, 32)].iter()));
    }

    #[test]
    fn flip_requires_delay_and_difference() {
        assert!(!should_flip_dr(false, true, false));
        assert!(should_flip_dr(true, true, false));
        assert!(!should_flip_dr(true, true, true));
    }

    #[test]
    fn pp_handshake_happy_path_without_verification() {
        let (s, a) = handle_pp_event(PointToPointHandshake::Halted, PpEvent::Start, false);
        assert_eq!(s, PointToPointHandshake::Initialized);
        assert_eq!(a, PpAction::SendInitialization);

        let init = Initialization {
            srcnode: 20,
            node_type: NodeType::Level1Router,
            blksize: 576,
            timer: 10,
        };
        let (s, a) = handle_pp_event(s, PpEvent::InitializationReceived(init), false);
        assert_eq!(s, PointToPointHandshake::Running);
        assert_eq!(a, PpAction::None);
    }

    #[test]
    fn unexpected_message_halts_and_rejects() {
        let (s, a) = handle_pp_event(PointToPointHandshake::Running, PpEvent::Unexpected, false);
        assert_eq!(s, PointToPointHandshake::Halted);
        assert_eq!(a, PpAction::Reject);
    }
}
