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

//! Area routing database (C6): per-destination-area reachability between
//! areas, with the same shape as [`crate::l1_db`] indexed by area instead of
//! node.

use crate::constants::{INFC, INFH, MAXC, MAXH};
use crate::route_table::{Output, Recomputed, RoutingTable};

/// The Level 2 (area) routing database, keyed by destination area number.
#[derive(Debug)]
pub struct L2Database {
    table: RoutingTable<u8>,
    /// `true` iff any Level 2 adjacency exists on any circuit.
    attached: bool,
}

impl L2Database {
    /// Construct a database with the local area's own row seeded.
    pub fn new(local_area: u8) -> Self {
        let mut table = RoutingTable::new(INFH, INFC, MAXH, MAXC);
        table.set_self(local_area);
        L2Database {
            table,
            attached: false,
        }
    }

    /// Apply one advertised `(hop, cost)` entry for a destination area,
    /// identical arithmetic to L1 (§4.6).
    pub fn update_entry(
        &mut self,
        dest_area: u8,
        output: Output,
        advertised_hop: u8,
        advertised_cost: u16,
        circuit_cost: u16,
    ) -> bool {
        let new_hop = advertised_hop.saturating_add(1).min(INFH);
        let new_cost = (advertised_cost as u32 + circuit_cost as u32).min(INFC as u32) as u16;
        self.table.write(dest_area, output, new_hop, new_cost)
    }

    /// Remove every entry learned via a dropped output.
    pub fn remove_output(&mut self, output: Output) -> Vec<u8> {
        self.table.remove_output(output)
    }

    /// Recompute minima and chosen output for one destination area.
    pub fn recompute(&mut self, dest_area: u8) -> Recomputed {
        self.table.recompute(dest_area)
    }

    /// Current `AMinhop[area]`.
    pub fn minhop(&self, dest_area: u8) -> u8 {
        self.table.minhop(dest_area)
    }

    /// Current `AMincost[area]`.
    pub fn mincost(&self, dest_area: u8) -> u16 {
        self.table.mincost(dest_area)
    }

    /// `true` iff the area is reachable.
    pub fn is_reachable(&self, dest_area: u8) -> bool {
        self.table.is_reachable(dest_area)
    }

    /// Current chosen output adjacency toward the area.
    pub fn oa(&self, dest_area: u8) -> Option<Output> {
        self.table.oa(dest_area)
    }

    /// Set `ASrm[area, k]` for every circuit in `circuits`.
    pub fn mark_srm(&mut self, dest_area: u8, circuits: impl IntoIterator<Item = u16>) {
        self.table.mark_srm(dest_area, circuits)
    }

    /// Clear `ASrm[area, c]` after a successful send.
    pub fn clear_srm(&mut self, dest_area: u8, circuit: u16) {
        self.table.clear_srm(dest_area, circuit)
    }

    /// `true` iff `ASrm[area, c]` is set.
    pub fn srm(&self, dest_area: u8, circuit: u16) -> bool {
        self.table.srm(dest_area, circuit)
    }

    /// Areas with `ASrm[*, circuit]` set, for building an update message.
    pub fn pending_on(&self, circuit: u16) -> Vec<u8> {
        self.table.pending_on(circuit)
    }

    /// `true` iff no `ASrm` bit is set anywhere.
    pub fn srm_is_empty(&self) -> bool {
        self.table.srm_is_empty()
    }

    /// Every destination area known to this database.
    pub fn destinations(&self) -> Vec<u8> {
        self.table.destinations()
    }

    /// `AttachedFlg`: whether any Level 2 adjacency currently exists.
    pub fn attached(&self) -> bool {
        self.attached
    }

    /// Update `AttachedFlg`. Returns `true` if this was a transition to
    /// attached (the caller should mark the local area reachable from the
    /// area-forwarding viewpoint, per §4.6).
    pub fn set_attached(&mut self, attached: bool) -> bool {
        let became_attached = attached && !self.attached;
        self.attached = attached;
        became_attached
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attached_flag_transition() {
        let mut db = L2Database::new(1);
        assert!(!db.attached());
        assert!(db.set_attached(true));
        assert!(!db.set_attached(true));
        assert!(db.attached());
    }

    #[test]
    fn reachability_across_area() {
        let mut db = L2Database::new(1);
        let output = Output::Circuit(1);
        db.update_entry(2, output, 0, 0, 7);
        let r = db.recompute(2);
        assert_eq!(r.mincost, 7);
        assert!(db.is_reachable(2));
        assert!(!db.is_reachable(3));
    }
}
