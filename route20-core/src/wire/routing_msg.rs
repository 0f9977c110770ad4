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

//! Level 1 and Level 2 routing messages (C9).
//!
//! The same grammar serves both levels; which routing database an instance
//! updates is determined by the control byte ([`ControlFlags::Level1Routing`]
//! vs. [`ControlFlags::Level2Routing`]), not by anything in the body.

use super::{read_u16, require_len, ControlFlags};
use crate::constants::{INFC, INFH, MAXC, MAXH};
use crate::error::WireError;

/// One `(hops, cost)` entry for a single destination in a routing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Hop count, `0..=Maxh`, or [`crate::constants::INFH`] for unreachable.
    pub hops: u8,
    /// Cost, `0..=Maxc`, or [`crate::constants::INFC`] for unreachable.
    pub cost: u16,
}

impl RoutingEntry {
    fn pack(&self) -> u16 {
        ((self.hops as u16) << 10) | (self.cost & 0x03FF)
    }

    fn unpack(raw: u16) -> Result<Self, WireError> {
        let hops = (raw >> 10) as u8;
        let cost = raw & 0x03FF;
        if hops != INFH && hops > MAXH {
            return Err(WireError::FieldOutOfRange {
                field: "hops",
                value: hops as i64,
            });
        }
        if cost != INFC && cost > MAXC {
            return Err(WireError::FieldOutOfRange {
                field: "cost",
                value: cost as i64,
            });
        }
        Ok(RoutingEntry { hops, cost })
    }
}

/// A routing message: a contiguous run of entries starting at `startid`,
/// advertising each destination's `(Minhop, Mincost)` (or `(Infh, Infc)`
/// under split horizon).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMessage {
    /// Sender's node number.
    pub srcnode: u16,
    /// First destination id covered by `entries`.
    pub startid: u16,
    /// One entry per destination, in ascending id order from `startid`.
    pub entries: Vec<RoutingEntry>,
}

const HEADER_LEN: usize = 5;

impl RoutingMessage {
    /// Encode to wire bytes under the given control byte (Level 1 or Level
    /// 2).
    pub fn encode(&self, control: ControlFlags) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.entries.len() * 2);
        buf.push(control as u8);
        buf.extend_from_slice(&self.srcnode.to_le_bytes());
        buf.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.startid.to_le_bytes());
        for e in &self.entries {
            buf.extend_from_slice(&e.pack().to_le_bytes());
        }
        buf
    }

    /// Decode from wire bytes (control byte included, but not validated
    /// against Level 1 vs. Level 2 here; the caller already dispatched on
    /// it).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, HEADER_LEN)?;
        let srcnode = read_u16(buf, 1)?;
        let count = read_u16(buf, 3)? as usize;
        let startid = read_u16(buf, 5)?;
        require_len(buf, HEADER_LEN + 2 + count * 2)?;
        let mut entries = Vec::with_capacity(count);
        let mut offset = HEADER_LEN + 2;
        for _ in 0..count {
            let raw = read_u16(buf, offset)?;
            entries.push(RoutingEntry::unpack(raw)?);
            offset += 2;
        }
        Ok(RoutingMessage {
            srcnode,
            startid,
            entries,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let m = RoutingMessage {
            srcnode: 10,
            startid: 0,
            entries: vec![
                RoutingEntry { hops: 0, cost: 0 },
                RoutingEntry { hops: 1, cost: 4 },
                RoutingEntry {
                    hops: INFH,
                    cost: INFC,
                },
            ],
        };
        let bytes = m.encode(ControlFlags::Level1Routing);
        assert_eq!(RoutingMessage::decode(&bytes).unwrap(), m);
    }

    #[test]
    fn rejects_hop_out_of_range() {
        let raw: u16 = ((MAXH as u16 + 1) << 10) | 0;
        assert!(RoutingEntry::unpack(raw).is_err());
    }

    #[test]
    fn truncated_entries() {
        let mut bytes = RoutingMessage {
            srcnode: 1,
            startid: 0,
            entries: vec![RoutingEntry { hops: 0, cost: 0 }],
        }
        .encode(ControlFlags::Level1Routing);
        bytes.truncate(bytes.len() - 1);
        assert!(RoutingMessage::decode(&bytes).is_err());
    }
}
