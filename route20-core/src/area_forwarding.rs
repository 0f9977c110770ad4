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

//! Area forwarding database (C7).
//!
//! `AReach`/`AOA` are views over [`crate::l2_db::L2Database`] rather than a
//! separate store: `AMincost[area] < Infc` already lives there, and the
//! chosen output for an area is already `L2Database::oa`. This module is the
//! narrow read-only surface the forwarding process (C10) is allowed to call,
//! so that C10 never reaches into the area database's mutation methods.

use crate::l2_db::L2Database;
use crate::route_table::Output;

/// `IsAreaReachable(area) = AMincost[area] < Infc`.
pub fn is_area_reachable(l2: &L2Database, area: u8) -> bool {
    l2.is_reachable(area)
}

/// The output adjacency a long-format packet destined for `area` should be
/// forwarded on, if the area is reachable.
pub fn output_for_area(l2: &L2Database, area: u8) -> Option<Output> {
    if l2.is_reachable(area) {
        l2.oa(area)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::l2_db::L2Database;

    #[test]
    fn unknown_area_is_unreachable() {
        let db = L2Database::new(1);
        assert!(!is_area_reachable(&db, 5));
        assert!(output_for_area(&db, 5).is_none());
    }

    #[test]
    fn reachable_area_has_output() {
        let mut db = L2Database::new(1);
        let output = Output::Circuit(1);
        db.update_entry(2, output, 0, 0, 7);
        db.recompute(2);
        assert!(is_area_reachable(&db, 2));
        assert_eq!(output_for_area(&db, 2), Some(output));
    }
}
