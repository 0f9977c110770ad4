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

//! Level 1 routing database (C5): per-destination-node reachability within
//! the local area.

use crate::constants::{INFC, INFH, MAXC, MAXH};
use crate::route_table::{Output, Recomputed, RoutingTable};

/// The Level 1 routing database, keyed by destination node number.
#[derive(Debug)]
pub struct L1Database {
    table: RoutingTable<u16>,
}

impl L1Database {
    /// Construct a database with the local node's own row seeded per §4.5:
    /// `Hop[self,SelfNode] = 0`, `Cost[self,SelfNode] = 0`.
    pub fn new(local_node: u16) -> Self {
        let mut table = RoutingTable::new(INFH, INFC, MAXH, MAXC);
        table.set_self(local_node);
        L1Database { table }
    }

    /// Apply one advertised `(hop, cost)` entry learned from adjacency
    /// `output` on circuit `circuit_cost`, per C5's update-on-input rule:
    /// `newHop = min(hop+1, Infh)`, `newCost = min(cost+circuit_cost, Infc)`.
    /// Returns `true` if the stored entry changed.
    pub fn update_entry(
        &mut self,
        dest_node: u16,
        output: Output,
        advertised_hop: u8,
        advertised_cost: u16,
        circuit_cost: u16,
    ) -> bool {
        let new_hop = advertised_hop.saturating_add(1).min(INFH);
        let new_cost = (advertised_cost as u32 + circuit_cost as u32).min(INFC as u32) as u16;
        self.table.write(dest_node, output, new_hop, new_cost)
    }

    /// Remove every entry learned via a dropped output (circuit down or
    /// adjacency expired), returning the destinations that need
    /// recomputation.
    pub fn remove_output(&mut self, output: Output) -> Vec<u16> {
        self.table.remove_output(output)
    }

    /// Recompute minima and chosen output for one destination (C8 steps
    /// 1-3).
    pub fn recompute(&mut self, dest_node: u16) -> Recomputed {
        self.table.recompute(dest_node)
    }

    /// Current `Minhop[d]`.
    pub fn minhop(&self, dest_node: u16) -> u8 {
        self.table.minhop(dest_node)
    }

    /// Current `Mincost[d]`.
    pub fn mincost(&self, dest_node: u16) -> u16 {
        self.table.mincost(dest_node)
    }

    /// `true` iff `d` is reachable.
    pub fn is_reachable(&self, dest_node: u16) -> bool {
        self.table.is_reachable(dest_node)
    }

    /// Current chosen output adjacency for `d`.
    pub fn oa(&self, dest_node: u16) -> Option<Output> {
        self.table.oa(dest_node)
    }

    /// Set `Srm[d, k]` for every circuit in `circuits`.
    pub fn mark_srm(&mut self, dest_node: u16, circuits: impl IntoIterator<Item = u16>) {
        self.table.mark_srm(dest_node, circuits)
    }

    /// Clear `Srm[d, c]` after a successful send.
    pub fn clear_srm(&mut self, dest_node: u16, circuit: u16) {
        self.table.clear_srm(dest_node, circuit)
    }

    /// `true` iff `Srm[d, c]` is set.
    pub fn srm(&self, dest_node: u16, circuit: u16) -> bool {
        self.table.srm(dest_node, circuit)
    }

    /// Destinations with `Srm[*, circuit]` set, for building an update
    /// message.
    pub fn pending_on(&self, circuit: u16) -> Vec<u16> {
        self.table.pending_on(circuit)
    }

    /// `true` iff no `Srm` bit is set anywhere (idempotence check, §8).
    pub fn srm_is_empty(&self) -> bool {
        self.table.srm_is_empty()
    }

    /// Every destination node known to this database.
    pub fn destinations(&self) -> Vec<u16> {
        self.table.destinations()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::Address;

    #[test]
    fn self_row_reachable_at_zero() {
        let db = L1Database::new(10);
        assert_eq!(db.mincost(10), 0);
        assert_eq!(db.minhop(10), 0);
    }

    #[test]
    fn update_and_recompute() {
        let mut db = L1Database::new(10);
        let output = Output::Circuit(1);
        assert!(db.update_entry(20, output, 0, 0, 4));
        let r = db.recompute(20);
        assert_eq!(r.mincost, 4);
        assert_eq!(r.minhop, 1);
        assert_eq!(r.oa, Some(output));
        assert!(r.changed);
    }

    #[test]
    fn unreachable_beyond_max() {
        let mut db = L1Database::new(10);
        let output = Output::Circuit(1);
        db.update_entry(20, output, MAXH, MAXC, MAXC);
        let r = db.recompute(20);
        assert_eq!(r.mincost, INFC);
        assert_eq!(r.minhop, INFH);
        assert_eq!(r.oa, None);
    }

    #[test]
    fn minhop_and_mincost_are_independent_minima() {
        let mut db = L1Database::new(10);
        // Output A: hop 2, cost 10 (raw advertised values chosen so the
        // arithmetic in `update_entry` lands exactly here).
        db.update_entry(20, Output::Circuit(1), 1, 10, 0);
        // Output B: hop 5, cost 3 — cheaper but more hops.
        db.update_entry(20, Output::Circuit(2), 4, 3, 0);
        let r = db.recompute(20);
        assert_eq!(r.minhop, 2, "Minhop must be the independent min over every output");
        assert_eq!(r.mincost, 3, "Mincost must be the independent min over every output");
        // OA still follows lowest cost, not lowest hop.
        assert_eq!(r.oa, Some(Output::Circuit(2)));
    }

    #[test]
    fn tie_break_prefers_lower_slot_then_adjacency_id() {
        let mut db = L1Database::new(10);
        let a = Output::Adjacency(2, Address::new(1, 30).unwrap());
        let b = Output::Adjacency(1, Address::new(1, 40).unwrap());
        db.update_entry(20, a, 0, 4, 0);
        db.update_entry(20, b, 0, 4, 0);
        let r = db.recompute(20);
        assert_eq!(r.oa, Some(b));
    }
}
