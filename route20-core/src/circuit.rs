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

//! Circuit abstraction (C2): a uniform open/start/read/write/close surface
//! over Ethernet and point-to-point DDCMP datalinks.
//!
//! The concrete datalink backends (raw-Ethernet/pcap, UDP-encapsulated
//! Ethernet, DDCMP-over-TCP) live in `route20-runtime`, which implements
//! [`Datalink`] for each; this crate only ever sees the trait object, the
//! idiomatic stand-in for the C original's function-pointer vtable.

use std::fmt;

use crate::address::Address;
use crate::constants::LEVEL1_BATCH_SIZE;
use crate::error::CircuitError;

/// The two datalink families a circuit can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitKind {
    /// Broadcast-capable Ethernet (pcap or UDP-encapsulated).
    Ethernet,
    /// Point-to-point DDCMP.
    Ddcmp,
}

/// Generic circuit lifecycle state shared by both circuit kinds (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Not yet started, or taken down.
    Off,
    /// Point-to-point only: handshake in progress.
    HelloSent,
    /// Ready to pass traffic: `Up` for Ethernet, `Running` for point-to-point.
    Running,
}

/// Point-to-point handshake sub-state (C4), tracked only for DDCMP circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointToPointHandshake {
    /// No messages exchanged yet, or a reject/error returned here.
    Halted,
    /// Sent our Initialization, awaiting the peer's.
    Initialized,
    /// Exchanged Initialization, awaiting/sending Verification.
    VerificationSent,
    /// Handshake complete; hellos and data flow normally.
    Running,
}

/// Kind-specific state that does not apply to the other circuit kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitKindState {
    /// Ethernet: no handshake, but designated-router candidacy applies.
    Ethernet {
        /// Whether this node is currently the circuit's designated router.
        designated_router: bool,
        /// Whether this node is the circuit's designated router.
        up: bool,
    },
    /// Point-to-point DDCMP: three-way handshake state and the single
    /// adjacent node's identity once known.
    Ddcmp {
        /// Current handshake sub-state.
        handshake: PointToPointHandshake,
        /// The peer's address, known from its Initialization message.
        adjacent_node: Option<Address>,
    },
}

/// The datalink down-call surface (§6): provided by a backend in
/// `route20-runtime`, called by the core.
pub trait Datalink: fmt::Debug {
    /// Acquire the underlying OS resource (open a capture, bind a socket).
    fn open(&mut self) -> bool;
    /// Bring the datalink up once opened (start DDCMP handshake timers,
    /// join a multicast group, etc).
    fn start(&mut self) -> bool;
    /// Non-blocking read of the next frame, if any is ready.
    fn read_packet(&mut self) -> Option<Vec<u8>>;
    /// Send a frame. `to` is `None` for a broadcast/multicast send (hellos),
    /// `Some` for a directed send to a known adjacency.
    fn write_packet(&mut self, to: Option<Address>, packet: &[u8], is_hello: bool) -> bool;
    /// Release the underlying OS resource.
    fn close(&mut self);
    /// The raw file descriptor the event loop should register for
    /// readiness, once opened (§5, `mio::Token` registration). Backends
    /// that have no such descriptor (none of the three in
    /// `route20-runtime` lack one, but a future callback-driven backend
    /// might) return `None`; the event loop falls back to polling them
    /// opportunistically on every timer wakeup.
    fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        None
    }
    /// Explicit rejection supported by some point-to-point backends;
    /// `false` means the backend has no such notion and the caller should
    /// fall back to an ordinary `close`/`set_down`.
    fn reject(&mut self) -> bool {
        false
    }
}

/// One configured circuit (C2).
pub struct Circuit {
    /// Table slot, `1..=NC`; stable identity used to index routing matrices.
    pub slot: u16,
    /// Configured name, used in logging and configuration.
    pub name: String,
    /// Configured cost, `1..=Maxc`.
    pub cost: u16,
    /// Round-robin scan cursor for the update process (C9), seeded at
    /// construction by [`Circuit::first_level1_node`].
    pub next_level1_node: u16,
    /// Generic lifecycle state.
    pub state: CircuitState,
    /// Kind-specific state.
    pub kind_state: CircuitKindState,
    datalink: Box<dyn Datalink>,
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("slot", &self.slot)
            .field("name", &self.name)
            .field("cost", &self.cost)
            .field("state", &self.state)
            .field("kind_state", &self.kind_state)
            .finish()
    }
}

impl Circuit {
    /// Construct a new Ethernet circuit. Rejects cost 0 (§8 boundary).
    pub fn new_ethernet(
        slot: u16,
        name: impl Into<String>,
        cost: u16,
        local_node: Address,
        datalink: Box<dyn Datalink>,
    ) -> Result<Self, CircuitError> {
        let name = name.into();
        if cost == 0 {
            return Err(CircuitError::ZeroCost(name));
        }
        Ok(Circuit {
            slot,
            next_level1_node: Self::first_level1_node(local_node),
            name,
            cost,
            state: CircuitState::Off,
            kind_state: CircuitKindState::Ethernet {
                designated_router: false,
                up: false,
            },
            datalink,
        })
    }

    /// Construct a new DDCMP point-to-point circuit. Rejects cost 0.
    pub fn new_ddcmp(
        slot: u16,
        name: impl Into<String>,
        cost: u16,
        local_node: Address,
        datalink: Box<dyn Datalink>,
    ) -> Result<Self, CircuitError> {
        let name = name.into();
        if cost == 0 {
            return Err(CircuitError::ZeroCost(name));
        }
        Ok(Circuit {
            slot,
            next_level1_node: Self::first_level1_node(local_node),
            name,
            cost,
            state: CircuitState::Off,
            kind_state: CircuitKindState::Ddcmp {
                handshake: PointToPointHandshake::Halted,
                adjacent_node: None,
            },
            datalink,
        })
    }

    /// Batch-align the local node id so it falls in the first Level 1 batch
    /// scanned by the update process, guaranteeing it is reachable from
    /// peers within the first full update cycle after startup.
    pub fn first_level1_node(local_node: Address) -> u16 {
        (local_node.node() / LEVEL1_BATCH_SIZE) * LEVEL1_BATCH_SIZE
    }

    /// `true` for Ethernet circuits, which admit many adjacencies and carry
    /// designated-router election; `false` for DDCMP, which admits exactly
    /// one.
    pub fn is_broadcast(&self) -> bool {
        matches!(self.kind_state, CircuitKindState::Ethernet { .. })
    }

    /// The circuit's kind.
    pub fn kind(&self) -> CircuitKind {
        match self.kind_state {
            CircuitKindState::Ethernet { .. } => CircuitKind::Ethernet,
            CircuitKindState::Ddcmp { .. } => CircuitKind::Ddcmp,
        }
    }

    /// Open the underlying datalink.
    pub fn open(&mut self) -> Result<(), CircuitError> {
        if self.datalink.open() {
            Ok(())
        } else {
            Err(CircuitError::OpenFailed(self.name.clone()))
        }
    }

    /// Start the underlying datalink.
    pub fn start(&mut self) -> Result<(), CircuitError> {
        if self.datalink.start() {
            Ok(())
        } else {
            Err(CircuitError::StartFailed(self.name.clone()))
        }
    }

    /// Non-blocking read of the next frame.
    pub fn read_packet(&mut self) -> Option<Vec<u8>> {
        self.datalink.read_packet()
    }

    /// The underlying datalink's raw file descriptor, for event-loop
    /// registration (§5).
    pub fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        self.datalink.raw_fd()
    }

    /// Send a frame, taking the circuit down on write failure (§4.12).
    pub fn write_packet(&mut self, to: Option<Address>, packet: &[u8], is_hello: bool) -> Result<(), CircuitError> {
        if self.datalink.write_packet(to, packet, is_hello) {
            Ok(())
        } else {
            self.set_down();
            Err(CircuitError::WriteFailed(self.name.clone()))
        }
    }

    /// Bring the circuit up, logging as the original does: neighbor
    /// identity for point-to-point, nothing extra for Ethernet.
    pub fn set_up(&mut self) {
        match &mut self.kind_state {
            CircuitKindState::Ethernet { up, .. } => {
                *up = true;
                log::info!("circuit {} up", self.name);
            }
            CircuitKindState::Ddcmp { adjacent_node, .. } => {
                log::info!(
                    "circuit {} up, adjacent node = {:?}",
                    self.name,
                    adjacent_node
                );
            }
        }
        self.state = CircuitState::Running;
    }

    /// Take the circuit down. Returns `true` if this was a state change
    /// (so the caller can decide whether to evict adjacencies and rerun the
    /// decision process).
    pub fn set_down(&mut self) -> bool {
        let changed = self.state != CircuitState::Off;
        if changed {
            log::info!("circuit {} down", self.name);
        }
        self.state = CircuitState::Off;
        match &mut self.kind_state {
            CircuitKindState::Ethernet { up, designated_router } => {
                *up = false;
                *designated_router = false;
            }
            CircuitKindState::Ddcmp {
                handshake,
                adjacent_node,
            } => {
                *handshake = PointToPointHandshake::Halted;
                *adjacent_node = None;
            }
        }
        changed
    }

    /// Reject the circuit: route to the datalink's own rejection if it
    /// supports one, otherwise fall back to an ordinary down transition.
    pub fn reject(&mut self) {
        if self.datalink.reject() {
            log::info!("circuit {} rejected", self.name);
        } else {
            self.set_down();
        }
    }

    /// Close the underlying datalink.
    pub fn close(&mut self) {
        self.datalink.close();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default)]
    struct MockDatalink {
        opened: bool,
    }

    impl Datalink for MockDatalink {
        fn open(&mut self) -> bool {
            self.opened = true;
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
        Address::new(1, 50).unwrap()
    }

    #[test]
    fn zero_cost_rejected() {
        let err = Circuit::new_ethernet(1, "eth-0", 0, local(), Box::new(MockDatalink::default()))
            .unwrap_err();
        assert_eq!(err, CircuitError::ZeroCost("eth-0".to_string()));
    }

    #[test]
    fn first_level1_node_batch_aligned() {
        assert_eq!(Circuit::first_level1_node(Address::new(1, 50).unwrap()), 32);
        assert_eq!(Circuit::first_level1_node(Address::new(1, 31).unwrap()), 0);
    }

    #[test]
    fn up_down_transitions() {
        let mut c =
            Circuit::new_ethernet(1, "eth-0", 4, local(), Box::new(MockDatalink::default())).unwrap();
        c.open().unwrap();
        c.set_up();
        assert_eq!(c.state, CircuitState::Running);
        assert!(c.set_down());
        assert_eq!(c.state, CircuitState::Off);
        assert!(!c.set_down());
    }
}
