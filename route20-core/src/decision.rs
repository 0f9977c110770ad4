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

//! Decision process (C8): recompute minima on any input change and mark
//! affected destinations for re-advertisement.
//!
//! This module only ever touches rows the caller names as `affected` — the
//! routing databases themselves don't track which rows are dirty, so
//! whatever triggered the change (a routing message, an adjacency
//! add/remove, a circuit going down) is responsible for naming every row it
//! touched. Running this twice over the same `affected` set with no
//! intervening input is idempotent: the second pass finds `changed == false`
//! everywhere and sets no further `Srm` bits (§8).

use crate::l1_db::L1Database;
use crate::l2_db::L2Database;

/// Recompute every destination node in `affected`; for each one whose
/// `OA` or advertised tuple moved, set `Srm` on every circuit in
/// `broadcast_circuits`. Returns the destinations that actually changed.
pub fn run_l1(
    db: &mut L1Database,
    affected: impl IntoIterator<Item = u16>,
    broadcast_circuits: &[u16],
) -> Vec<u16> {
    let mut changed = Vec::new();
    for dest in affected {
        let result = db.recompute(dest);
        if result.changed {
            db.mark_srm(dest, broadcast_circuits.iter().copied());
            changed.push(dest);
        }
    }
    changed
}

/// Area-database counterpart of [`run_l1`].
pub fn run_l2(
    db: &mut L2Database,
    affected: impl IntoIterator<Item = u8>,
    broadcast_circuits: &[u16],
) -> Vec<u8> {
    let mut changed = Vec::new();
    for dest in affected {
        let result = db.recompute(dest);
        if result.changed {
            db.mark_srm(dest, broadcast_circuits.iter().copied());
            changed.push(dest);
        }
    }
    changed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_table::Output;

    #[test]
    fn idempotent_on_rerun() {
        let mut db = L1Database::new(1);
        db.update_entry(20, Output::Circuit(1), 0, 4, 0);
        let changed_first = run_l1(&mut db, vec![20], &[2, 3]);
        assert_eq!(changed_first, vec![20]);
        assert!(db.srm(20, 2));
        db.clear_srm(20, 2);
        db.clear_srm(20, 3);

        let changed_second = run_l1(&mut db, vec![20], &[2, 3]);
        assert!(changed_second.is_empty());
        assert!(db.srm_is_empty());
    }
}
