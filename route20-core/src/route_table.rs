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

//! Shared matrix shape behind both the Level 1 (`l1_db`) and Level 2
//! (`l2_db`) routing databases (C5/C6).
//!
//! The original keeps one `Hop`/`Cost` array per level indexed by
//! `[destination][output]`. Both levels need the exact same update-on-input,
//! minima, and `Srm` bookkeeping, differing only in what a "destination" is
//! (node vs. area); that shape is factored out here and the two database
//! modules specialize it.

use std::collections::{HashMap, HashSet};

use crate::address::Address;

/// A next-hop choice: either a point-to-point circuit (its only neighbor),
/// or a specific router adjacency reachable on a broadcast circuit. Mirrors
/// `OA` (§3): a destination's chosen output is always one of these, never a
/// bare circuit with ambiguous next-hop identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    /// This node itself (row owner for destination == self).
    SelfNode,
    /// Point-to-point circuit, addressed by its stable slot.
    Circuit(u16),
    /// A specific router adjacency on a broadcast circuit.
    Adjacency(u16, Address),
}

impl Output {
    /// Circuit slot this output sends on, or `None` for [`Output::SelfNode`].
    pub fn circuit_slot(&self) -> Option<u16> {
        match self {
            Output::SelfNode => None,
            Output::Circuit(slot) => Some(*slot),
            Output::Adjacency(slot, _) => Some(*slot),
        }
    }

    /// Adjacency id used for tie-breaking broadcast outputs; point-to-point
    /// outputs have no adjacency id of their own and sort first.
    pub fn adjacency_id(&self) -> Option<Address> {
        match self {
            Output::Adjacency(_, id) => Some(*id),
            _ => None,
        }
    }
}

/// One `(hop, cost)` pair; `Infh`/`Infc` callers pass in represent
/// unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopCost {
    /// Hop count.
    pub hop: u8,
    /// Cost.
    pub cost: u16,
}

/// Result of recomputing one destination's row (C8 steps 1-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recomputed {
    /// New `Minhop[d]`.
    pub minhop: u8,
    /// New `Mincost[d]`.
    pub mincost: u16,
    /// New `OA[d]`, or `None` if unreachable.
    pub oa: Option<Output>,
    /// Whether `OA[d]`, or the advertised `(minhop, mincost)` tuple,
    /// changed from before recomputation (C8 step 4 trigger).
    pub changed: bool,
}

/// Generic `[destination][output] -> (hop, cost)` matrix with derived
/// minima, chosen output, and per-circuit `Srm` bits.
#[derive(Debug)]
pub struct RoutingTable<D: Copy + Eq + std::hash::Hash + Ord> {
    rows: HashMap<D, HashMap<Output, HopCost>>,
    minhop: HashMap<D, u8>,
    mincost: HashMap<D, u16>,
    oa: HashMap<D, Output>,
    srm: HashMap<D, HashSet<u16>>,
    inf_hop: u8,
    inf_cost: u16,
    max_hop: u8,
    max_cost: u16,
}

impl<D: Copy + Eq + std::hash::Hash + Ord> RoutingTable<D> {
    /// Construct an empty table. `inf_hop`/`inf_cost` are the sentinel
    /// "unreachable" values (`Infh`/`Infc`); `max_hop`/`max_cost` are the
    /// largest finite values the architecture allows (`Maxh`/`Maxc`).
    pub fn new(inf_hop: u8, inf_cost: u16, max_hop: u8, max_cost: u16) -> Self {
        RoutingTable {
            rows: HashMap::new(),
            minhop: HashMap::new(),
            mincost: HashMap::new(),
            oa: HashMap::new(),
            srm: HashMap::new(),
            inf_hop,
            inf_cost,
            max_hop,
            max_cost,
        }
    }

    /// Seed the self row: reachable at hop 0, cost 0, via [`Output::SelfNode`].
    pub fn set_self(&mut self, dest: D) {
        self.rows.entry(dest).or_default().insert(
            Output::SelfNode,
            HopCost { hop: 0, cost: 0 },
        );
        self.minhop.insert(dest, 0);
        self.mincost.insert(dest, 0);
        self.oa.insert(dest, Output::SelfNode);
    }

    /// Write one `(dest, output) -> (hop, cost)` entry (C5 update-on-input
    /// step). Returns `true` if the value actually changed.
    pub fn write(&mut self, dest: D, output: Output, hop: u8, cost: u16) -> bool {
        let entry = self.rows.entry(dest).or_default();
        let new = HopCost { hop, cost };
        let changed = entry.get(&output) != Some(&new);
        entry.insert(output, new);
        changed
    }

    /// Remove every entry for a dropped output across every destination
    /// (used when a circuit or adjacency goes away), returning the set of
    /// destinations whose row changed and therefore need recomputation.
    pub fn remove_output(&mut self, output: Output) -> Vec<D> {
        let mut affected = Vec::new();
        for (dest, row) in self.rows.iter_mut() {
            if row.remove(&output).is_some() {
                affected.push(*dest);
            }
        }
        affected
    }

    /// Recompute `Minhop`, `Mincost`, and `OA` for one destination (C8 steps
    /// 1-3), and report whether the advertised tuple or chosen output moved.
    pub fn recompute(&mut self, dest: D) -> Recomputed {
        let prev_tuple = (
            self.minhop.get(&dest).copied(),
            self.mincost.get(&dest).copied(),
        );
        let prev_oa = self.oa.get(&dest).copied();

        let row = self.rows.get(&dest);
        let mut best: Option<(Output, u8, u16)> = None;
        let mut independent_min_hop: Option<u8> = None;
        let mut independent_min_cost: Option<u16> = None;
        if let Some(row) = row {
            for (&output, hc) in row {
                independent_min_hop = Some(match independent_min_hop {
                    None => hc.hop,
                    Some(h) => h.min(hc.hop),
                });
                independent_min_cost = Some(match independent_min_cost {
                    None => hc.cost,
                    Some(c) => c.min(hc.cost),
                });
                let better = match best {
                    None => true,
                    Some((bo, _, bc)) => {
                        hc.cost < bc
                            || (hc.cost == bc && hc.hop < row[&bo].hop)
                            || (hc.cost == bc
                                && hc.hop == row[&bo].hop
                                && Self::tie_break(output, bo))
                    }
                };
                if better {
                    best = Some((output, hc.hop, hc.cost));
                }
            }
        }

        // `Minhop`/`Mincost` (C8 steps 1-2) are each the independent minimum
        // over every output, not the hop/cost of whichever output minimizes
        // the other field; `OA` (step 3) is still chosen by lowest cost.
        let minhop = match independent_min_hop {
            Some(h) if h <= self.max_hop => h,
            _ => self.inf_hop,
        };
        let mincost = match independent_min_cost {
            Some(c) if c <= self.max_cost => c,
            _ => self.inf_cost,
        };
        let oa = match best {
            Some((o, h, c)) if h <= self.max_hop && c <= self.max_cost => Some(o),
            _ => None,
        };

        self.minhop.insert(dest, minhop);
        self.mincost.insert(dest, mincost);
        match oa {
            Some(o) => {
                self.oa.insert(dest, o);
            }
            None => {
                self.oa.remove(&dest);
            }
        }

        let changed = prev_tuple != (Some(minhop), Some(mincost)) || prev_oa != oa;
        Recomputed {
            minhop,
            mincost,
            oa,
            changed,
        }
    }

    fn tie_break(a: Output, b: Output) -> bool {
        let slot_a = a.circuit_slot().unwrap_or(0);
        let slot_b = b.circuit_slot().unwrap_or(0);
        if slot_a != slot_b {
            return slot_a < slot_b;
        }
        a.adjacency_id() < b.adjacency_id()
    }

    /// Current `Minhop[d]`, or the infinite sentinel if unknown.
    pub fn minhop(&self, dest: D) -> u8 {
        self.minhop.get(&dest).copied().unwrap_or(self.inf_hop)
    }

    /// Current `Mincost[d]`, or the infinite sentinel if unknown.
    pub fn mincost(&self, dest: D) -> u16 {
        self.mincost.get(&dest).copied().unwrap_or(self.inf_cost)
    }

    /// `true` iff `d` is reachable (§3 invariant 2).
    pub fn is_reachable(&self, dest: D) -> bool {
        self.mincost(dest) < self.inf_cost && self.minhop(dest) < self.inf_hop
    }

    /// Current chosen output for `d`, if reachable.
    pub fn oa(&self, dest: D) -> Option<Output> {
        self.oa.get(&dest).copied()
    }

    /// Set `Srm[d, c]` for every circuit in `circuits` (C8 step 4 / C5).
    pub fn mark_srm(&mut self, dest: D, circuits: impl IntoIterator<Item = u16>) {
        let set = self.srm.entry(dest).or_default();
        set.extend(circuits);
    }

    /// Clear `Srm[d, c]` after a successful send (C9).
    pub fn clear_srm(&mut self, dest: D, circuit: u16) {
        if let Some(set) = self.srm.get_mut(&dest) {
            set.remove(&circuit);
        }
    }

    /// `true` iff `Srm[d, c]` is set.
    pub fn srm(&self, dest: D, circuit: u16) -> bool {
        self.srm.get(&dest).map_or(false, |s| s.contains(&circuit))
    }

    /// Every destination with `Srm[d, c]` set, for building an update
    /// message on circuit `c`.
    pub fn pending_on(&self, circuit: u16) -> Vec<D> {
        let mut v: Vec<D> = self
            .srm
            .iter()
            .filter(|(_, set)| set.contains(&circuit))
            .map(|(d, _)| *d)
            .collect();
        v.sort();
        v
    }

    /// `true` iff `Srm` is empty across every destination and circuit
    /// (idempotence check, §8).
    pub fn srm_is_empty(&self) -> bool {
        self.srm.values().all(|s| s.is_empty())
    }

    /// Every destination currently known, sorted.
    pub fn destinations(&self) -> Vec<D> {
        let mut v: Vec<D> = self.rows.keys().copied().collect();
        v.sort();
        v
    }
}
