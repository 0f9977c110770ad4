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

//! Timer wheel (A4): every periodic and one-shot timeout in the engine goes
//! through here, backing the designated-router delay, hello periods, full
//! routing updates, and listener expiry.
//!
//! Timers live in a fixed slot table addressed by a stable [`TimerId`]
//! rather than by pointer, the same stable-index discipline used for
//! circuits (§9): a timer's identity survives other timers being added or
//! removed.

/// What a fired timer is for. The event loop matches on this to decide what
/// to run; the timer wheel itself is oblivious to engine semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPurpose {
    /// Re-check designated-router candidacy `DRDELAY` seconds after a
    /// circuit came up.
    DrDelayExpiry { circuit_slot: u16 },
    /// Emit a router hello on a broadcast circuit (period `BCT1`).
    RouterHello { circuit_slot: u16 },
    /// Emit an All-Endnodes hello; only runs while this node is DR on the
    /// circuit (period `T3`).
    AllEndnodesHello { circuit_slot: u16 },
    /// Emit a hello/test on a point-to-point circuit (period `T3`).
    PointToPointHello { circuit_slot: u16 },
    /// Full Level 1 routing update on a circuit (period `T1`).
    FullUpdateL1 { circuit_slot: u16 },
    /// Full Level 2 routing update on a circuit (period `T1`).
    FullUpdateL2 { circuit_slot: u16 },
    /// Sweep the adjacency table for expired entries.
    AdjacencyExpiry,
    /// Re-check the configuration file's mtime for changes.
    ConfigFilePoll,
}

/// Opaque, stable handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

struct Slot {
    due: u64,
    period: Option<u64>,
    purpose: TimerPurpose,
    live: bool,
}

/// The timer wheel itself: an unordered slot table, scanned linearly. `NC`
/// is at most 16 and each circuit owns a handful of timers, so a handful of
/// dozens of entries never justifies a priority queue.
#[derive(Default)]
pub struct TimerWheel {
    slots: Vec<Slot>,
}

impl TimerWheel {
    /// Construct an empty wheel.
    pub fn new() -> Self {
        TimerWheel { slots: Vec::new() }
    }

    /// Schedule a timer. `period: None` means one-shot; firing a periodic
    /// timer re-arms it at `due + period` rather than `now + period`, so a
    /// late wakeup does not push later firings out.
    pub fn create_timer(&mut self, due: u64, period: Option<u64>, purpose: TimerPurpose) -> TimerId {
        self.slots.push(Slot {
            due,
            period,
            purpose,
            live: true,
        });
        TimerId(self.slots.len() - 1)
    }

    /// Cancel a timer. Idempotent.
    pub fn stop_timer(&mut self, id: TimerId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.live = false;
        }
    }

    /// Seconds until the next due timer, or `None` if the wheel is empty
    /// (the event loop should then block indefinitely on I/O alone).
    pub fn seconds_until_next_due(&self, now: u64) -> Option<u64> {
        self.slots
            .iter()
            .filter(|s| s.live)
            .map(|s| s.due.saturating_sub(now))
            .min()
    }

    /// Run every timer due at or before `now`, in registration order
    /// (matching same-tick ordering, §5), re-arming periodic ones. Returns
    /// the purposes that fired, each paired with its `TimerId` so the
    /// caller can `stop_timer` a one-shot it does not want to repeat.
    pub fn fire_due(&mut self, now: u64) -> Vec<(TimerId, TimerPurpose)> {
        let mut fired = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.live && slot.due <= now {
                fired.push((TimerId(i), slot.purpose));
                match slot.period {
                    Some(period) => slot.due += period,
                    None => slot.live = false,
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut wheel = TimerWheel::new();
        let id = wheel.create_timer(5, None, TimerPurpose::AdjacencyExpiry);
        assert!(wheel.fire_due(4).is_empty());
        let fired = wheel.fire_due(5);
        assert_eq!(fired, vec![(id, TimerPurpose::AdjacencyExpiry)]);
        assert!(wheel.fire_due(100).is_empty());
    }

    #[test]
    fn periodic_rearms_from_due_not_now() {
        let mut wheel = TimerWheel::new();
        wheel.create_timer(10, Some(10), TimerPurpose::RouterHello { circuit_slot: 1 });
        assert_eq!(wheel.fire_due(10).len(), 1);
        assert_eq!(wheel.seconds_until_next_due(10), Some(10));
        assert_eq!(wheel.fire_due(25).len(), 1);
        assert_eq!(wheel.seconds_until_next_due(25), Some(5));
    }

    #[test]
    fn stop_timer_prevents_future_firing() {
        let mut wheel = TimerWheel::new();
        let id = wheel.create_timer(5, Some(5), TimerPurpose::AdjacencyExpiry);
        wheel.stop_timer(id);
        assert!(wheel.fire_due(100).is_empty());
    }

    #[test]
    fn same_tick_fires_in_registration_order() {
        let mut wheel = TimerWheel::new();
        let a = wheel.create_timer(5, None, TimerPurpose::RouterHello { circuit_slot: 1 });
        let b = wheel.create_timer(5, None, TimerPurpose::RouterHello { circuit_slot: 2 });
        let fired = wheel.fire_due(5);
        assert_eq!(fired[0].0, a);
        assert_eq!(fired[1].0, b);
    }
}
