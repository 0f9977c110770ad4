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

//! Adjacency table (C3): known neighbors per circuit.
//!
//! Time is represented as a monotonic tick count (seconds) supplied by the
//! caller rather than read from the OS clock directly, so the decision and
//! expiry logic can be driven deterministically in tests the way the timer
//! wheel ([`crate::timer`]) drives the rest of the engine.

use std::collections::HashMap;

use crate::address::Address;
use crate::constants::{NBEA, NBRA};
use crate::error::AdjacencyError;

/// What role an adjacency plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyKind {
    /// Level 1 router: participates in L1 routing and DR election.
    Level1Router,
    /// Level 2 router: participates in L2 (inter-area) routing.
    Level2Router,
    /// End node: not routing-capable, never a DR candidate.
    Endnode,
}

impl AdjacencyKind {
    /// Routers (of either level) are routing-capable; end nodes are not.
    pub fn is_router(self) -> bool {
        !matches!(self, AdjacencyKind::Endnode)
    }
}

/// One known neighbor on one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    /// Circuit this neighbor was heard on.
    pub circuit_slot: u16,
    /// Neighbor's address.
    pub id: Address,
    /// Neighbor's designated-router election priority (meaningless for
    /// non-routers, carried anyway since the wire format always has it).
    pub priority: u8,
    /// Neighbor's role.
    pub kind: AdjacencyKind,
    /// Tick at which the most recent valid hello was received.
    pub last_heard_from: u64,
    /// Seconds after `last_heard_from` with no hello before this adjacency
    /// is evicted (§3 invariant 6): `BCT1*BCT3MULT` for broadcast,
    /// `T3*BCT3MULT` for point-to-point.
    pub listener_timer: u64,
}

impl Adjacency {
    fn expired(&self, now: u64) -> bool {
        now.saturating_sub(self.last_heard_from) > self.listener_timer
    }
}

#[derive(Debug, Default)]
struct CircuitAdjacencies {
    routers: Vec<Adjacency>,
    endnodes: Vec<Adjacency>,
}

/// The full adjacency table, one bucket per circuit slot.
#[derive(Debug, Default)]
pub struct AdjacencyTable {
    by_circuit: HashMap<u16, CircuitAdjacencies>,
}

impl AdjacencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new adjacency, or refresh an existing one's `priority`,
    /// `kind`, and `last_heard_from` on a valid hello. Enforces the per-pool
    /// capacity (`NBRA` routers, `NBEA` end nodes) on broadcast circuits; a
    /// point-to-point circuit (not broadcast) is capped at a single
    /// adjacency regardless of kind.
    ///
    /// Returns `true` if this created a brand-new adjacency (the caller
    /// should trigger the decision process for a new routing-capable
    /// neighbor), `false` if it only refreshed an existing one.
    pub fn insert_or_update(
        &mut self,
        circuit_slot: u16,
        id: Address,
        priority: u8,
        kind: AdjacencyKind,
        now: u64,
        listener_timer: u64,
        is_broadcast: bool,
    ) -> Result<bool, AdjacencyError> {
        let bucket = self.by_circuit.entry(circuit_slot).or_default();
        let pool = if kind.is_router() {
            &mut bucket.routers
        } else {
            &mut bucket.endnodes
        };
        if let Some(existing) = pool.iter_mut().find(|a| a.id == id) {
            existing.priority = priority;
            existing.kind = kind;
            existing.last_heard_from = now;
            existing.listener_timer = listener_timer;
            return Ok(false);
        }
        if !is_broadcast && (!bucket.routers.is_empty() || !bucket.endnodes.is_empty()) {
            return Err(AdjacencyError::CapacityExceeded {
                circuit_slot,
                is_router: kind.is_router(),
            });
        }
        let limit = if kind.is_router() {
            NBRA as usize
        } else {
            NBEA as usize
        };
        if pool.len() >= limit {
            return Err(AdjacencyError::CapacityExceeded {
                circuit_slot,
                is_router: kind.is_router(),
            });
        }
        pool.push(Adjacency {
            circuit_slot,
            id,
            priority,
            kind,
            last_heard_from: now,
            listener_timer,
        });
        Ok(true)
    }

    /// All adjacencies on a circuit, routers first.
    pub fn by_circuit(&self, circuit_slot: u16) -> impl Iterator<Item = &Adjacency> {
        self.by_circuit
            .get(&circuit_slot)
            .into_iter()
            .flat_map(|b| b.routers.iter().chain(b.endnodes.iter()))
    }

    /// Router adjacencies on a circuit, for designated-router election.
    pub fn routers_on(&self, circuit_slot: u16) -> impl Iterator<Item = &Adjacency> {
        self.by_circuit
            .get(&circuit_slot)
            .into_iter()
            .flat_map(|b| b.routers.iter())
    }

    /// All adjacencies across every circuit.
    pub fn iter(&self) -> impl Iterator<Item = &Adjacency> {
        self.by_circuit
            .values()
            .flat_map(|b| b.routers.iter().chain(b.endnodes.iter()))
    }

    /// Look up a specific adjacency.
    pub fn get(&self, circuit_slot: u16, id: Address) -> Option<&Adjacency> {
        self.by_circuit(circuit_slot).find(|a| a.id == id)
    }

    /// Remove every adjacency belonging to a circuit (used when the circuit
    /// goes down).
    pub fn remove_circuit(&mut self, circuit_slot: u16) -> Vec<Adjacency> {
        match self.by_circuit.remove(&circuit_slot) {
            Some(bucket) => bucket
                .routers
                .into_iter()
                .chain(bucket.endnodes.into_iter())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sweep every circuit for adjacencies whose listener timer has
    /// elapsed, removing and returning them (§3 invariant 6).
    pub fn expire(&mut self, now: u64) -> Vec<Adjacency> {
        let mut expired = Vec::new();
        for bucket in self.by_circuit.values_mut() {
            let (still_routers, gone_routers): (Vec<_>, Vec<_>) =
                bucket.routers.drain(..).partition(|a| !a.expired(now));
            bucket.routers = still_routers;
            expired.extend(gone_routers);
            let (still_end, gone_end): (Vec<_>, Vec<_>) =
                bucket.endnodes.drain(..).partition(|a| !a.expired(now));
            bucket.endnodes = still_end;
            expired.extend(gone_end);
        }
        expired
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn addr(n: u16) -> Address {
        Address::new(1, n).unwrap()
    }

    #[test]
    fn insert_then_refresh() {
        let mut t = AdjacencyTable::new();
        assert!(t
            .insert_or_update(1, addr(10), 64, AdjacencyKind::Level1Router, 0, 540, true)
            .unwrap());
        assert!(!t
            .insert_or_update(1, addr(10), 64, AdjacencyKind::Level1Router, 5, 540, true)
            .unwrap());
        assert_eq!(t.by_circuit(1).count(), 1);
    }

    #[test]
    fn point_to_point_capped_at_one() {
        let mut t = AdjacencyTable::new();
        t.insert_or_update(1, addr(10), 64, AdjacencyKind::Level1Router, 0, 30, false)
            .unwrap();
        let err = t
            .insert_or_update(1, addr(20), 64, AdjacencyKind::Level1Router, 0, 30, false)
            .unwrap_err();
        assert_eq!(
            err,
            AdjacencyError::CapacityExceeded {
                circuit_slot: 1,
                is_router: true
            }
        );
    }

    #[test]
    fn expiry_sweeps_stale_adjacencies() {
        let mut t = AdjacencyTable::new();
        t.insert_or_update(1, addr(10), 64, AdjacencyKind::Level1Router, 0, 30, true)
            .unwrap();
        assert!(t.expire(20).is_empty());
        let expired = t.expire(31);
        assert_eq!(expired.len(), 1);
        assert_eq!(t.by_circuit(1).count(), 0);
    }

    #[test]
    fn router_pool_capacity_enforced() {
        let mut t = AdjacencyTable::new();
        for i in 0..NBRA {
            t.insert_or_update(1, addr(i + 1), 64, AdjacencyKind::Level1Router, 0, 30, true)
                .unwrap();
        }
        let err = t
            .insert_or_update(1, addr(NBRA + 1), 64, AdjacencyKind::Level1Router, 0, 30, true)
            .unwrap_err();
        assert_eq!(
            err,
            AdjacencyError::CapacityExceeded {
                circuit_slot: 1,
                is_router: true
            }
        );
    }
}
