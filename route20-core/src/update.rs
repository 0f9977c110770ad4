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

//! Update process (C9): builds Level 1 and Level 2 routing messages per
//! circuit, honoring split horizon with poisoned reverse and the
//! batch-ordering requirement that puts the local node's batch first.

use crate::constants::{INFC, INFH, LEVEL1_BATCH_SIZE, NA, NN};
use crate::l1_db::L1Database;
use crate::l2_db::L2Database;
use crate::wire::routing_msg::{RoutingEntry, RoutingMessage};

/// Align `id` down to the start of its `LEVEL1_BATCH_SIZE`-wide batch.
pub fn batch_start(id: u16) -> u16 {
    (id / LEVEL1_BATCH_SIZE) * LEVEL1_BATCH_SIZE
}

fn l1_batch_message(db: &L1Database, start: u16, local_node: u16, circuit_slot: u16) -> RoutingMessage {
    let start = start.max(1);
    let end = start.saturating_add(LEVEL1_BATCH_SIZE - 1).min(NN);
    let mut entries = Vec::with_capacity((end - start + 1) as usize);
    for id in start..=end {
        entries.push(advertised_entry_l1(db, id, circuit_slot));
    }
    RoutingMessage {
        srcnode: local_node,
        startid: start,
        entries,
    }
}

fn advertised_entry_l1(db: &L1Database, id: u16, circuit_slot: u16) -> RoutingEntry {
    let poisoned = db
        .oa(id)
        .and_then(|o| o.circuit_slot())
        .map_or(false, |slot| slot == circuit_slot);
    if poisoned || !db.is_reachable(id) {
        RoutingEntry {
            hops: INFH,
            cost: INFC,
        }
    } else {
        RoutingEntry {
            hops: db.minhop(id),
            cost: db.mincost(id),
        }
    }
}

/// Every batch start with at least one pending destination on `circuit`.
fn srm_batch_starts_l1(db: &L1Database, circuit_slot: u16) -> Vec<u16> {
    let mut starts: Vec<u16> = db
        .pending_on(circuit_slot)
        .into_iter()
        .map(batch_start)
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Build the Level 1 routing message(s) due on `circuit_slot` right now.
///
/// `full` selects between the periodic T1 behavior (every batch in the
/// whole node-id space, starting with the batch that contains
/// `next_level1_node` so the local node is always seen first) and the
/// Srm-triggered behavior (only batches with a pending bit). After any send,
/// full or triggered, every destination in each emitted batch has its `Srm`
/// bit on `circuit_slot` cleared — a destination advertised by a periodic
/// update has no need for the triggered update that would otherwise follow
/// it.
pub fn build_l1_update(
    db: &mut L1Database,
    circuit_slot: u16,
    next_level1_node: u16,
    local_node: u16,
    full: bool,
) -> Vec<RoutingMessage> {
    let starts = if full {
        wrap_around_batches(batch_start(next_level1_node))
    } else {
        srm_batch_starts_l1(db, circuit_slot)
    };

    let mut messages = Vec::with_capacity(starts.len());
    for start in &starts {
        messages.push(l1_batch_message(db, *start, local_node, circuit_slot));
        let end = start.saturating_add(LEVEL1_BATCH_SIZE - 1).min(NN);
        for id in (*start).max(1)..=end {
            db.clear_srm(id, circuit_slot);
        }
    }
    messages
}

fn wrap_around_batches(first: u16) -> Vec<u16> {
    let batch_count = (NN as u32 / LEVEL1_BATCH_SIZE as u32) + 1;
    (0..batch_count)
        .map(|i| (first as u32 + i * LEVEL1_BATCH_SIZE as u32) % (batch_count * LEVEL1_BATCH_SIZE as u32))
        .map(|v| v as u16)
        .collect()
}

fn advertised_entry_l2(db: &L2Database, area: u8, circuit_slot: u16) -> RoutingEntry {
    let poisoned = db
        .oa(area)
        .and_then(|o| o.circuit_slot())
        .map_or(false, |slot| slot == circuit_slot);
    if poisoned || !db.is_reachable(area) {
        RoutingEntry {
            hops: INFH,
            cost: INFC,
        }
    } else {
        RoutingEntry {
            hops: db.minhop(area),
            cost: db.mincost(area),
        }
    }
}

/// Build the Level 2 routing message due on `circuit_slot`. Areas (`1..=NA`)
/// fit comfortably in a single message, so unlike Level 1 there is no
/// batching: `full` emits every area, a triggered update emits only areas
/// with `ASrm` set; either way every emitted area has `ASrm` on
/// `circuit_slot` cleared on return.
pub fn build_l2_update(
    db: &mut L2Database,
    circuit_slot: u16,
    local_node: u16,
    full: bool,
) -> Option<RoutingMessage> {
    let areas: Vec<u8> = if full {
        (1..=NA).collect()
    } else {
        let mut pending = db.pending_on(circuit_slot);
        pending.sort_unstable();
        pending
    };
    if areas.is_empty() {
        return None;
    }
    let startid = *areas.first().unwrap() as u16;
    let entries = areas
        .iter()
        .map(|&a| advertised_entry_l2(db, a, circuit_slot))
        .collect();
    for &a in &areas {
        db.clear_srm(a, circuit_slot);
    }
    Some(RoutingMessage {
        srcnode: local_node,
        startid,
        entries,
    })
}
