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

//! Architectural constants from the DNA Phase IV routing specification.

/// Maximum number of areas.
pub const NA: u8 = 63;
/// Maximum number of nodes per area.
pub const NN: u16 = 1023;
/// Maximum number of circuits.
pub const NC: u16 = 16;
/// Maximum number of broadcast routing adjacencies (routers) on one circuit.
pub const NBRA: u16 = 33;
/// Maximum number of broadcast end-node adjacencies on one circuit.
pub const NBEA: u16 = 1024;
/// Infinite hop count: a destination with this hop count is unreachable.
pub const INFH: u8 = 31;
/// Infinite cost: a destination with this cost is unreachable.
pub const INFC: u16 = 1023;
/// Maximum finite hop count.
pub const MAXH: u8 = 30;
/// Maximum finite cost.
pub const MAXC: u16 = 1022;
/// Maximum visit count for a data packet before it is dropped as a loop.
pub const MAXV: u8 = 31;
/// Delay after circuit start before designated-router candidacy is acted on.
pub const DRDELAY_SECS: u64 = 5;
/// Point-to-point / general listener timeout base, and Level 1/2 full
/// routing update period.
pub const T1_SECS: u64 = 600;
/// Broadcast (Ethernet) router hello period.
pub const BCT1_SECS: u64 = 180;
/// Multiplier applied to a hello period to get its listener timeout.
pub const BCT3MULT: u32 = 3;
/// Point-to-point hello / "test" period, and the designated router's
/// All-Endnodes hello period. Not given a fixed value anywhere in the
/// surviving routing specification text; DESIGN.md records the chosen
/// default.
pub const T3_SECS: u64 = 10;
/// Minimum inter-message delay per circuit for triggered routing updates.
pub const T2_SECS: u64 = 1;
/// Interval at which the adjacency table is swept for listener-timeout
/// expiry (§3 invariant 6); cheap enough to run every few seconds given
/// `NC` is at most 16 circuits.
pub const ADJACENCY_EXPIRY_POLL_SECS: u64 = 5;
/// Node-id batch size used by the update process' round-robin scan.
pub const LEVEL1_BATCH_SIZE: u16 = 32;
/// Maximum length of a DECnet node name.
pub const MAXL: usize = 25;
/// Upper bound on the payload carried by a data packet.
pub const MAX_DATA_MESSAGE_BODY_SIZE: usize = 8192;

/// All-Routers multicast address (AB-00-00-03-00-00).
pub const ALL_ROUTERS_MULTICAST: [u8; 6] = [0xAB, 0x00, 0x00, 0x03, 0x00, 0x00];
/// All-L2-Routers multicast address (09-00-2B-02-00-00).
pub const ALL_L2_ROUTERS_MULTICAST: [u8; 6] = [0x09, 0x00, 0x2B, 0x02, 0x00, 0x00];
/// All-Endnodes multicast address (AB-00-00-04-00-00).
pub const ALL_ENDNODES_MULTICAST: [u8; 6] = [0xAB, 0x00, 0x00, 0x04, 0x00, 0x00];
/// Ethernet protocol type used by DECnet Phase IV routing traffic.
pub const DECNET_ETHERTYPE: u16 = 0x6003;
