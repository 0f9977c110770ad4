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

//! `RouterState` (§9, Design Notes: "Global mutable state"): the single
//! value that replaces the original's process-wide globals (`Hop`, `Cost`,
//! `Circuits`, the adjacency table, the timer wheel, ...). Every handler in
//! `route20-runtime`'s event loop takes `&mut RouterState` and one event
//! (a timer firing, a frame arriving on a circuit); nothing here reaches
//! back out to a datalink directly except through `Circuit::write_packet`.
//!
//! This module is the wiring, not new protocol logic: it calls into
//! [`crate::init_layer`], [`crate::decision`], [`crate::update`], and
//! [`crate::forwarding`] exactly the way they document themselves to be
//! called, and owns the slot tables (§9, "Cyclic references") those modules
//! are written against.

use std::collections::HashMap;

use crate::address::Address;
use crate::adjacency::{Adjacency, AdjacencyKind, AdjacencyTable};
use crate::area_forwarding;
use crate::circuit::{Circuit, CircuitKind, CircuitKindState, PointToPointHandshake};
use crate::constants::{ADJACENCY_EXPIRY_POLL_SECS, BCT1_SECS, BCT3MULT, DRDELAY_SECS, T1_SECS, T2_SECS, T3_SECS};
use crate::decision;
use crate::error::{AdjacencyError, CircuitError, ForwardingError};
use crate::forwarding::{self, Disposition, ForwardedPacket};
use crate::init_layer::{self, PpAction, PpEvent};
use crate::l1_db::L1Database;
use crate::l2_db::L2Database;
use crate::route_table::Output;
use crate::timer::{TimerPurpose, TimerWheel};
use crate::update;
use crate::wire::{self, Message};

/// What a caller should do with a frame the forwarding process decided
/// needs to leave on a different circuit, or a local delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Send `packet` (already encoded) on `circuit_slot`, to `to` if this is
    /// a directed send or `None` for a broadcast/multicast hello.
    Transmit {
        /// Circuit to send on.
        circuit_slot: u16,
        /// Directed destination, or `None` for broadcast.
        to: Option<Address>,
        /// Encoded wire bytes.
        packet: Vec<u8>,
        /// Whether this is a hello (affects some datalinks' framing).
        is_hello: bool,
    },
    /// Hand a payload up to NSP (§6 up-call).
    DeliverToNsp {
        /// Sender's address.
        from: Address,
        /// Destination's address (always local).
        to: Address,
        /// Opaque NSP payload.
        payload: Vec<u8>,
    },
}

/// The full process state threaded into every handler: node identity, the
/// circuit slot table, the adjacency table, both routing databases, and the
/// timer wheel (§9).
pub struct RouterState {
    /// This node's own address.
    pub local: Address,
    /// Configured routing level.
    pub is_level2: bool,
    /// Designated-router election priority.
    pub priority: u8,
    /// Circuits indexed by their stable slot.
    pub circuits: HashMap<u16, Circuit>,
    /// Known neighbors, per circuit.
    pub adjacencies: AdjacencyTable,
    /// Level 1 routing database.
    pub l1: L1Database,
    /// Level 2 routing database.
    pub l2: L2Database,
    /// Timer wheel driving every periodic and one-shot timeout.
    pub timers: TimerWheel,
    /// Tick a triggered update was last sent on a circuit, for `T2`
    /// rate-limiting in [`RouterState::flush_pending_updates`].
    last_triggered_update: HashMap<u16, u64>,
}

impl RouterState {
    /// Construct a fresh state for a node with no circuits yet; the caller
    /// adds circuits with [`RouterState::add_circuit`] before starting the
    /// event loop.
    pub fn new(local: Address, is_level2: bool, priority: u8) -> Self {
        let mut timers = TimerWheel::new();
        timers.create_timer(
            ADJACENCY_EXPIRY_POLL_SECS,
            Some(ADJACENCY_EXPIRY_POLL_SECS),
            TimerPurpose::AdjacencyExpiry,
        );
        RouterState {
            local,
            is_level2,
            priority,
            circuits: HashMap::new(),
            adjacencies: AdjacencyTable::new(),
            l1: L1Database::new(local.node()),
            l2: L2Database::new(local.area()),
            timers,
            last_triggered_update: HashMap::new(),
        }
    }

    /// Register a circuit and arm its startup timers: the per-kind hello
    /// period, and for Ethernet, the designated-router delay (§4.4). `now`
    /// is the current tick.
    pub fn add_circuit(&mut self, circuit: Circuit, now: u64) {
        let slot = circuit.slot;
        let kind = circuit.kind();
        self.circuits.insert(slot, circuit);
        match kind {
            CircuitKind::Ethernet => {
                self.timers.create_timer(
                    now,
                    Some(BCT1_SECS),
                    TimerPurpose::RouterHello { circuit_slot: slot },
                );
                self.timers.create_timer(
                    now + DRDELAY_SECS,
                    None,
                    TimerPurpose::DrDelayExpiry { circuit_slot: slot },
                );
            }
            CircuitKind::Ddcmp => {
                self.timers.create_timer(
                    now,
                    Some(T3_SECS),
                    TimerPurpose::PointToPointHello { circuit_slot: slot },
                );
            }
        }
        self.timers.create_timer(
            now + T1_SECS,
            Some(T1_SECS),
            TimerPurpose::FullUpdateL1 { circuit_slot: slot },
        );
        if self.is_level2 {
            self.timers.create_timer(
                now + T1_SECS,
                Some(T1_SECS),
                TimerPurpose::FullUpdateL2 { circuit_slot: slot },
            );
        }
    }

    /// Every circuit slot, for the decision process's Srm fan-out (C8 step
    /// 4). The scenario in §8 that withdraws a destination over a DDCMP line
    /// ("sets Srm[C,*] on all its circuits") only works if point-to-point
    /// circuits get marked too, so despite step 4's "every broadcast
    /// circuit" phrasing this fans out to every circuit the node has; split
    /// horizon (poisoned reverse) is what actually withholds the
    /// advertisement from the circuit a route was learned on, applied later
    /// at message-build time in [`crate::update`].
    fn all_circuit_slots(&self) -> Vec<u16> {
        self.circuits.values().map(|c| c.slot).collect()
    }

    fn listener_timer(&self, is_broadcast: bool) -> u64 {
        if is_broadcast {
            BCT1_SECS * BCT3MULT as u64
        } else {
            T3_SECS * BCT3MULT as u64
        }
    }

    /// Open and start every configured circuit, in slot order (§5,
    /// shutdown's mirror image: "circuits Close in reverse order"). Starting
    /// a DDCMP circuit immediately kicks off its handshake (§4.4,
    /// `Halted -> Initialized`), so this returns the resulting transmissions.
    pub fn start_all_circuits(&mut self, now: u64) -> Result<Vec<RouterAction>, CircuitError> {
        let mut slots: Vec<u16> = self.circuits.keys().copied().collect();
        slots.sort_unstable();
        let mut actions = Vec::new();
        for slot in slots {
            let circuit = self.circuits.get_mut(&slot).unwrap();
            circuit.open()?;
            circuit.start()?;
            if circuit.kind() == CircuitKind::Ddcmp {
                actions.extend(self.handle_pp_event(slot, PpEvent::Start, now));
            }
        }
        Ok(actions)
    }

    /// Handle one timer firing (§5: "the event loop runs all expired
    /// timers before dispatching the signalled handlers"). Returns any
    /// resulting transmissions.
    pub fn handle_timer(&mut self, purpose: TimerPurpose, now: u64) -> Vec<RouterAction> {
        match purpose {
            TimerPurpose::DrDelayExpiry { circuit_slot } => self.check_designated_router(circuit_slot, true),
            TimerPurpose::RouterHello { circuit_slot } => self.emit_router_hello(circuit_slot),
            TimerPurpose::AllEndnodesHello { circuit_slot } => self.emit_endnode_hello(circuit_slot),
            TimerPurpose::PointToPointHello { circuit_slot } => self.emit_pp_hello(circuit_slot),
            TimerPurpose::FullUpdateL1 { circuit_slot } => self.emit_l1_update(circuit_slot, true),
            TimerPurpose::FullUpdateL2 { circuit_slot } => self.emit_l2_update(circuit_slot, true),
            TimerPurpose::AdjacencyExpiry => self.expire_adjacencies(now),
            TimerPurpose::ConfigFilePoll => Vec::new(),
        }
    }

    /// Sweep the whole adjacency table for listener-timeout expiry (§3
    /// invariant 6) and re-run the decision process for everything that
    /// changed.
    pub fn expire_adjacencies(&mut self, now: u64) -> Vec<RouterAction> {
        let expired = self.adjacencies.expire(now);
        let mut actions = Vec::new();
        for adj in expired {
            actions.extend(self.drop_adjacency(adj));
        }
        actions
    }

    fn drop_adjacency(&mut self, adj: Adjacency) -> Vec<RouterAction> {
        let output = Output::Adjacency(adj.circuit_slot, adj.id);
        let affected_l1 = self.l1.remove_output(output);
        decision::run_l1(&mut self.l1, affected_l1, &self.all_circuit_slots());
        let mut actions = Vec::new();
        if adj.kind == AdjacencyKind::Level2Router {
            let affected_l2 = self.l2.remove_output(output);
            decision::run_l2(&mut self.l2, affected_l2, &self.all_circuit_slots());
            let still_attached = self.adjacencies.iter().any(|a| a.kind == AdjacencyKind::Level2Router);
            self.l2.set_attached(still_attached);
        }
        if adj.kind.is_router() {
            actions.extend(self.check_designated_router(adj.circuit_slot, false));
        }
        actions
    }

    /// Take a circuit down on a datalink failure (§4.12): the circuit
    /// transitions down, every adjacency on it is expired by the fast path,
    /// and the decision process reruns.
    pub fn circuit_down(&mut self, circuit_slot: u16) -> Vec<RouterAction> {
        if let Some(c) = self.circuits.get_mut(&circuit_slot) {
            c.set_down();
        }
        let removed = self.adjacencies.remove_circuit(circuit_slot);
        let mut actions = Vec::new();
        for adj in removed {
            actions.extend(self.drop_adjacency(adj));
        }
        let affected_l1 = self.l1.remove_output(Output::Circuit(circuit_slot));
        decision::run_l1(&mut self.l1, affected_l1, &self.all_circuit_slots());
        let affected_l2 = self.l2.remove_output(Output::Circuit(circuit_slot));
        decision::run_l2(&mut self.l2, affected_l2, &self.all_circuit_slots());
        actions
    }

    /// Re-run the designated-router candidacy check for one Ethernet
    /// circuit (§4.4), flipping the flag only once `DRDELAY` has elapsed
    /// and candidacy actually differs.
    fn check_designated_router(&mut self, circuit_slot: u16, drdelay_elapsed: bool) -> Vec<RouterAction> {
        let circuit = match self.circuits.get(&circuit_slot) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let (currently_dr, is_ethernet) = match circuit.kind_state {
            CircuitKindState::Ethernet { designated_router, .. } => (designated_router, true),
            _ => (false, false),
        };
        if !is_ethernet {
            return Vec::new();
        }
        let peers: Vec<Adjacency> = self
            .adjacencies
            .routers_on(circuit_slot)
            .filter(|a| a.id.area() == self.local.area())
            .copied()
            .collect();
        let candidate = init_layer::is_dr_candidate(self.local, self.priority, peers.iter());
        if !init_layer::should_flip_dr(drdelay_elapsed, candidate, currently_dr) {
            return Vec::new();
        }
        let circuit = self.circuits.get_mut(&circuit_slot).unwrap();
        if let CircuitKindState::Ethernet { designated_router, .. } = &mut circuit.kind_state {
            *designated_router = candidate;
        }
        if candidate {
            log::info!("now the designated router on circuit {}", circuit.name);
            self.timers.create_timer(
                0,
                Some(T3_SECS),
                TimerPurpose::AllEndnodesHello { circuit_slot },
            );
        } else {
            log::info!("no longer the designated router on circuit {}", circuit.name);
        }
        Vec::new()
    }

    fn router_adjacency_summaries(&self, circuit_slot: u16) -> Vec<crate::wire::hello::AdjacencySummary> {
        self.adjacencies
            .routers_on(circuit_slot)
            .map(|a| crate::wire::hello::AdjacencySummary {
                router_id: a.id,
                priority: a.priority,
                two_way: true,
            })
            .collect()
    }

    fn emit_router_hello(&mut self, circuit_slot: u16) -> Vec<RouterAction> {
        if self.circuits.get(&circuit_slot).map_or(true, |c| !c.is_broadcast()) {
            return Vec::new();
        }
        let hello = crate::wire::hello::RouterHello {
            id: self.local,
            node_type: init_layer::local_node_type(self.is_level2),
            blksize: 1498,
            priority: self.priority,
            area: self.local.area(),
            timer: BCT1_SECS as u16,
            neighbors: self.router_adjacency_summaries(circuit_slot),
        };
        let packet = wire::encode(&Message::RouterHello(hello));
        vec![RouterAction::Transmit {
            circuit_slot,
            to: None,
            packet,
            is_hello: true,
        }]
    }

    fn emit_endnode_hello(&mut self, circuit_slot: u16) -> Vec<RouterAction> {
        let is_dr = matches!(
            self.circuits.get(&circuit_slot).map(|c| &c.kind_state),
            Some(CircuitKindState::Ethernet { designated_router: true, .. })
        );
        if !is_dr {
            // No longer DR: let this firing lapse silently rather than
            // hunting down the TimerId to cancel it. The wheel has no
            // purpose-keyed lookup, and the check above is cheap enough to
            // repeat every period until the circuit goes away entirely.
            return Vec::new();
        }
        let hello = crate::wire::hello::EndnodeHello {
            id: self.local,
            blksize: 1498,
            area: self.local.area(),
            timer: T3_SECS as u16,
        };
        let packet = wire::encode(&Message::EndnodeHello(hello));
        vec![RouterAction::Transmit {
            circuit_slot,
            to: None,
            packet,
            is_hello: true,
        }]
    }

    fn emit_pp_hello(&mut self, circuit_slot: u16) -> Vec<RouterAction> {
        let running = matches!(
            self.circuits.get(&circuit_slot).map(|c| &c.kind_state),
            Some(CircuitKindState::Ddcmp { handshake: PointToPointHandshake::Running, .. })
        );
        if !running {
            return Vec::new();
        }
        let init = crate::wire::init::Initialization {
            srcnode: self.local.node(),
            node_type: init_layer::local_node_type(self.is_level2),
            blksize: 1498,
            timer: T3_SECS as u16,
        };
        let packet = wire::encode(&Message::Initialization(init));
        vec![RouterAction::Transmit {
            circuit_slot,
            to: None,
            packet,
            is_hello: true,
        }]
    }

    fn emit_l1_update(&mut self, circuit_slot: u16, full: bool) -> Vec<RouterAction> {
        let circuit = match self.circuits.get(&circuit_slot) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let next = circuit.next_level1_node;
        let messages = update::build_l1_update(&mut self.l1, circuit_slot, next, self.local.node(), full);
        messages
            .into_iter()
            .map(|m| RouterAction::Transmit {
                circuit_slot,
                to: None,
                packet: wire::encode(&Message::Level1Routing(m)),
                is_hello: false,
            })
            .collect()
    }

    fn emit_l2_update(&mut self, circuit_slot: u16, full: bool) -> Vec<RouterAction> {
        if !self.is_level2 {
            return Vec::new();
        }
        match update::build_l2_update(&mut self.l2, circuit_slot, self.local.node(), full) {
            Some(m) => vec![RouterAction::Transmit {
                circuit_slot,
                to: None,
                packet: wire::encode(&Message::Level2Routing(m)),
                is_hello: false,
            }],
            None => Vec::new(),
        }
    }

    /// Any destination whose `Srm` bit is set anywhere gets a triggered
    /// update on the circuits that need it; called by the event loop after
    /// every batch of handlers runs. A circuit sent a triggered update less
    /// than `T2_SECS` ago is skipped and left pending for the next call.
    pub fn flush_pending_updates(&mut self, now: u64) -> Vec<RouterAction> {
        let mut actions = Vec::new();
        let mut slots: Vec<u16> = self.circuits.keys().copied().collect();
        slots.sort_unstable();
        for slot in slots {
            if let Some(&last) = self.last_triggered_update.get(&slot) {
                if now.saturating_sub(last) < T2_SECS {
                    continue;
                }
            }
            let mut slot_actions = self.emit_l1_update(slot, false);
            slot_actions.extend(self.emit_l2_update(slot, false));
            if !slot_actions.is_empty() {
                self.last_triggered_update.insert(slot, now);
            }
            actions.extend(slot_actions);
        }
        actions
    }

    /// Handle one decoded frame arriving on `circuit_slot` (dispatch step
    /// between C1 and C4/C9/C10 described in §2's data-flow summary).
    pub fn handle_frame(&mut self, circuit_slot: u16, frame: &[u8], now: u64) -> Vec<RouterAction> {
        match wire::decode(frame) {
            Ok(msg) => self.handle_message(circuit_slot, msg, now),
            Err(e) => {
                log::warn!("malformed message on circuit {}: {}", circuit_slot, e);
                Vec::new()
            }
        }
    }

    fn handle_message(&mut self, circuit_slot: u16, msg: Message, now: u64) -> Vec<RouterAction> {
        match msg {
            Message::RouterHello(h) => self.handle_router_hello(circuit_slot, h, now),
            Message::EndnodeHello(h) => self.handle_endnode_hello(circuit_slot, h, now),
            Message::Initialization(i) => self.handle_pp_event(circuit_slot, PpEvent::InitializationReceived(i), now),
            Message::Verification(v) => self.handle_pp_event(circuit_slot, PpEvent::VerificationReceived(v), now),
            Message::Level1Routing(m) => self.handle_l1_routing(circuit_slot, m),
            Message::Level2Routing(m) => self.handle_l2_routing(circuit_slot, m),
            Message::ShortData(p) => self.handle_short_data(p),
            Message::LongData(p) => self.handle_long_data(p),
        }
    }

    fn handle_router_hello(&mut self, circuit_slot: u16, hello: crate::wire::hello::RouterHello, now: u64) -> Vec<RouterAction> {
        if hello.area != self.local.area() {
            log::debug!("dropping hello from foreign area {}", hello.area);
            return Vec::new();
        }
        let is_broadcast = self.circuits.get(&circuit_slot).map_or(false, |c| c.is_broadcast());
        let listener = self.listener_timer(is_broadcast);
        let kind = match hello.node_type {
            crate::wire::init::NodeType::Level1Router => AdjacencyKind::Level1Router,
            crate::wire::init::NodeType::Level2Router => AdjacencyKind::Level2Router,
        };
        match self
            .adjacencies
            .insert_or_update(circuit_slot, hello.id, hello.priority, kind, now, listener, is_broadcast)
        {
            Ok(true) => {
                let mut actions = self.check_designated_router(circuit_slot, false);
                if kind == AdjacencyKind::Level2Router {
                    self.l2.set_attached(true);
                }
                actions.extend(self.recompute_for_new_adjacency());
                actions
            }
            Ok(false) => self.check_designated_router(circuit_slot, false),
            Err(AdjacencyError::CapacityExceeded { .. }) => {
                log::warn!("adjacency capacity exceeded on circuit {}, hello dropped", circuit_slot);
                Vec::new()
            }
            Err(_) => Vec::new(),
        }
    }

    fn handle_endnode_hello(&mut self, circuit_slot: u16, hello: crate::wire::hello::EndnodeHello, now: u64) -> Vec<RouterAction> {
        if hello.area != self.local.area() {
            return Vec::new();
        }
        let is_broadcast = self.circuits.get(&circuit_slot).map_or(false, |c| c.is_broadcast());
        let listener = self.listener_timer(is_broadcast);
        let _ = self.adjacencies.insert_or_update(
            circuit_slot,
            hello.id,
            0,
            AdjacencyKind::Endnode,
            now,
            listener,
            is_broadcast,
        );
        Vec::new()
    }

    fn recompute_for_new_adjacency(&mut self) -> Vec<RouterAction> {
        // A brand new routing-capable adjacency has no entries yet; the
        // decision process has nothing to recompute until a routing
        // message arrives from it. Nothing to do here beyond what
        // `handle_router_hello` already did.
        Vec::new()
    }

    fn handle_pp_event(&mut self, circuit_slot: u16, event: PpEvent, now: u64) -> Vec<RouterAction> {
        let circuit = match self.circuits.get_mut(&circuit_slot) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let state = match &circuit.kind_state {
            CircuitKindState::Ddcmp { handshake, .. } => *handshake,
            _ => return Vec::new(),
        };
        let (new_state, action) = init_layer::handle_pp_event(state, event.clone(), false);
        let peer = if let PpEvent::InitializationReceived(ref init) = event {
            Address::new(self.local.area(), init.srcnode)
        } else {
            None
        };
        if let CircuitKindState::Ddcmp { handshake, adjacent_node } = &mut circuit.kind_state {
            *handshake = new_state;
            if peer.is_some() {
                *adjacent_node = peer;
            }
        }
        let mut actions = Vec::new();
        match action {
            PpAction::SendInitialization => {
                let init = crate::wire::init::Initialization {
                    srcnode: self.local.node(),
                    node_type: init_layer::local_node_type(self.is_level2),
                    blksize: 1498,
                    timer: T3_SECS as u16,
                };
                actions.push(RouterAction::Transmit {
                    circuit_slot,
                    to: peer,
                    packet: wire::encode(&Message::Initialization(init)),
                    is_hello: true,
                });
            }
            PpAction::SendVerification => {
                let v = crate::wire::verification::Verification {
                    srcnode: self.local.node(),
                    fcnval: 0,
                };
                actions.push(RouterAction::Transmit {
                    circuit_slot,
                    to: peer,
                    packet: wire::encode(&Message::Verification(v)),
                    is_hello: true,
                });
            }
            PpAction::Reject => {
                if let Some(c) = self.circuits.get_mut(&circuit_slot) {
                    c.reject();
                }
                actions.extend(self.circuit_down(circuit_slot));
            }
            PpAction::RefreshListener | PpAction::None => {}
        }
        if new_state == PointToPointHandshake::Running {
            if let Some(c) = self.circuits.get_mut(&circuit_slot) {
                c.set_up();
            }
            if let Some(id) = peer {
                let listener = self.listener_timer(false);
                let kind = if self.is_level2 {
                    AdjacencyKind::Level2Router
                } else {
                    AdjacencyKind::Level1Router
                };
                let _ = self
                    .adjacencies
                    .insert_or_update(circuit_slot, id, self.priority, kind, now, listener, false);
                if kind == AdjacencyKind::Level2Router {
                    self.l2.set_attached(true);
                }
            }
        }
        actions
    }

    fn handle_l1_routing(&mut self, circuit_slot: u16, msg: crate::wire::routing_msg::RoutingMessage) -> Vec<RouterAction> {
        let peer = match Address::new(self.local.area(), msg.srcnode) {
            Some(a) => a,
            None => return Vec::new(),
        };
        let output = self.resolve_output(circuit_slot, peer);
        let circuit_cost = match self.circuits.get(&circuit_slot) {
            Some(c) => c.cost,
            None => return Vec::new(),
        };
        let mut affected = Vec::new();
        for (i, entry) in msg.entries.iter().enumerate() {
            let dest = msg.startid as u32 + i as u32;
            if dest == 0 || dest > crate::constants::NN as u32 {
                continue;
            }
            let dest = dest as u16;
            if self.l1.update_entry(dest, output, entry.hops, entry.cost, circuit_cost) {
                affected.push(dest);
            }
        }
        decision::run_l1(&mut self.l1, affected, &self.all_circuit_slots());
        Vec::new()
    }

    fn handle_l2_routing(&mut self, circuit_slot: u16, msg: crate::wire::routing_msg::RoutingMessage) -> Vec<RouterAction> {
        let peer = match Address::new(self.local.area(), msg.srcnode) {
            Some(a) => a,
            None => return Vec::new(),
        };
        let output = self.resolve_output(circuit_slot, peer);
        let circuit_cost = match self.circuits.get(&circuit_slot) {
            Some(c) => c.cost,
            None => return Vec::new(),
        };
        let mut affected = Vec::new();
        for (i, entry) in msg.entries.iter().enumerate() {
            let area = msg.startid as u32 + i as u32;
            if area == 0 || area > crate::constants::NA as u32 {
                continue;
            }
            let area = area as u8;
            if self.l2.update_entry(area, output, entry.hops, entry.cost, circuit_cost) {
                affected.push(area);
            }
        }
        decision::run_l2(&mut self.l2, affected, &self.all_circuit_slots());
        Vec::new()
    }

    fn resolve_output(&self, circuit_slot: u16, peer: Address) -> Output {
        if self.circuits.get(&circuit_slot).map_or(false, |c| c.is_broadcast()) {
            Output::Adjacency(circuit_slot, peer)
        } else {
            Output::Circuit(circuit_slot)
        }
    }

    fn handle_short_data(&mut self, packet: crate::wire::data::ShortDataPacket) -> Vec<RouterAction> {
        match forwarding::forward_short(self.local, &self.l1, packet) {
            Ok(Disposition::DeliverLocally { from, payload }) => vec![RouterAction::DeliverToNsp {
                from,
                to: self.local,
                payload,
            }],
            Ok(Disposition::Forward { output, packet }) => self.transmit_forwarded(output, packet),
            Err(e) => {
                self.log_forwarding_error(e);
                Vec::new()
            }
        }
    }

    fn handle_long_data(&mut self, packet: crate::wire::data::LongDataPacket) -> Vec<RouterAction> {
        match forwarding::forward_long(self.local, &self.l1, &self.l2, packet) {
            Ok(Disposition::DeliverLocally { from, payload }) => vec![RouterAction::DeliverToNsp {
                from,
                to: self.local,
                payload,
            }],
            Ok(Disposition::Forward { output, packet }) => self.transmit_forwarded(output, packet),
            Err(e) => {
                self.log_forwarding_error(e);
                Vec::new()
            }
        }
    }

    fn transmit_forwarded(&self, output: Output, packet: ForwardedPacket) -> Vec<RouterAction> {
        let circuit_slot = match output.circuit_slot() {
            Some(s) => s,
            None => return Vec::new(),
        };
        let to = output.adjacency_id();
        let bytes = match packet {
            ForwardedPacket::Short(p) => wire::encode(&Message::ShortData(p)),
            ForwardedPacket::Long(p) => wire::encode(&Message::LongData(p)),
        };
        vec![RouterAction::Transmit {
            circuit_slot,
            to,
            packet: bytes,
            is_hello: false,
        }]
    }

    fn log_forwarding_error(&self, e: ForwardingError) {
        match e {
            ForwardingError::LoopDetected => log::debug!("dropped data packet: {}", e),
            ForwardingError::AreaUnreachable(_) | ForwardingError::NodeUnreachable(_) => {
                log::debug!("dropped data packet: {}", e)
            }
            ForwardingError::Malformed => log::warn!("dropped data packet: {}", e),
        }
    }

    /// `true` iff a long-format packet addressed to `area` can currently be
    /// forwarded (C7 up-call used outside the fast path, e.g. by network
    /// management).
    pub fn is_area_reachable(&self, area: u8) -> bool {
        area_forwarding::is_area_reachable(&self.l2, area)
    }

    /// Final "adjacency-down" hello flushed on every Ethernet circuit
    /// before shutdown (§5 cancellation), so peers evict this node
    /// promptly instead of waiting out the full listener timeout.
    pub fn shutdown_hellos(&self) -> Vec<RouterAction> {
        self.circuits
            .values()
            .filter(|c| c.is_broadcast())
            .map(|c| {
                let hello = crate::wire::hello::RouterHello {
                    id: self.local,
                    node_type: init_layer::local_node_type(self.is_level2),
                    blksize: 1498,
                    priority: self.priority,
                    area: self.local.area(),
                    timer: BCT1_SECS as u16,
                    neighbors: Vec::new(),
                };
                RouterAction::Transmit {
                    circuit_slot: c.slot,
                    to: None,
                    packet: wire::encode(&Message::RouterHello(hello)),
                    is_hello: true,
                }
            })
            .collect()
    }

    /// Close every circuit in reverse slot order (§5).
    pub fn close_all_circuits(&mut self) {
        let mut slots: Vec<u16> = self.circuits.keys().copied().collect();
        slots.sort_unstable_by(|a, b| b.cmp(a));
        for slot in slots {
            if let Some(c) = self.circuits.get_mut(&slot) {
                c.close();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuit::Datalink;

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

    fn local() -> Address {
        Address::new(1, 10).unwrap()
    }

    #[test]
    fn two_node_ethernet_dr_election() {
        let mut state = RouterState::new(local(), false, 64);
        let circuit = Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(NullDatalink)).unwrap();
        state.add_circuit(circuit, 0);
        state.start_all_circuits(0).unwrap();

        let hello = crate::wire::hello::RouterHello {
            id: Address::new(1, 20).unwrap(),
            node_type: init_layer::local_node_type(false),
            blksize: 1498,
            priority: 64,
            area: 1,
            timer: 180,
            neighbors: vec![],
        };
        let frame = wire::encode(&Message::RouterHello(hello));
        state.handle_frame(1, &frame, 0);
        state.handle_timer(TimerPurpose::DrDelayExpiry { circuit_slot: 1 }, 5);

        match state.circuits[&1].kind_state {
            CircuitKindState::Ethernet { designated_router, .. } => assert!(designated_router),
            _ => panic!("expected ethernet state"),
        }
    }

    #[test]
    fn l1_routing_message_updates_mincost() {
        let mut state = RouterState::new(local(), false, 64);
        let circuit = Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(NullDatalink)).unwrap();
        state.add_circuit(circuit, 0);

        let msg = crate::wire::routing_msg::RoutingMessage {
            srcnode: 20,
            startid: 20,
            entries: vec![crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 }],
        };
        let frame = wire::encode(&Message::Level1Routing(msg));
        state.handle_frame(1, &frame, 0);
        assert_eq!(state.l1.mincost(20), 4);
        assert_eq!(state.l1.minhop(20), 1);
    }

    #[test]
    fn short_data_packet_forwarded_on_learned_route() {
        let mut state = RouterState::new(local(), false, 64);
        let circuit = Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(NullDatalink)).unwrap();
        state.add_circuit(circuit, 0);
        let msg = crate::wire::routing_msg::RoutingMessage {
            srcnode: 20,
            startid: 30,
            entries: vec![crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 }],
        };
        state.handle_frame(1, &wire::encode(&Message::Level1Routing(msg)), 0);

        let packet = crate::wire::data::ShortDataPacket {
            dstnode: 30,
            srcnode: 99,
            visits: 0,
            payload: vec![1, 2, 3],
        };
        let actions = state.handle_frame(1, &wire::encode(&Message::ShortData(packet)), 0);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            RouterAction::Transmit { circuit_slot, .. } => assert_eq!(*circuit_slot, 1),
            _ => panic!("expected a transmit action"),
        }
    }

    #[test]
    fn l1_routing_message_near_u16_max_startid_does_not_panic() {
        let mut state = RouterState::new(local(), false, 64);
        let circuit = Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(NullDatalink)).unwrap();
        state.add_circuit(circuit, 0);

        let msg = crate::wire::routing_msg::RoutingMessage {
            srcnode: 20,
            startid: 0xFFFF,
            entries: vec![
                crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 },
                crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 },
            ],
        };
        let frame = wire::encode(&Message::Level1Routing(msg));
        // Must not overflow while narrowing `startid + i` back to `u16`; both
        // entries fall outside `1..=NN` and are silently skipped.
        state.handle_frame(1, &frame, 0);
    }

    #[test]
    fn l2_routing_message_near_u16_max_startid_does_not_panic() {
        let mut state = RouterState::new(local(), true, 64);
        let circuit = Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(NullDatalink)).unwrap();
        state.add_circuit(circuit, 0);

        let msg = crate::wire::routing_msg::RoutingMessage {
            srcnode: 20,
            startid: 0xFFFF,
            entries: vec![
                crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 },
                crate::wire::routing_msg::RoutingEntry { hops: 0, cost: 0 },
            ],
        };
        let frame = wire::encode(&Message::Level2Routing(msg));
        state.handle_frame(1, &frame, 0);
    }
}
