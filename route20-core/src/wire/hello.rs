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

//! Ethernet router and endnode hello messages.

use super::init::NodeType;
use super::{read_u16, require_len, ControlFlags};
use crate::address::Address;
use crate::error::WireError;

/// Fixed version triplet this implementation advertises and requires.
pub const VERSION: (u8, u8, u8) = (2, 0, 0);

/// One (router-id, priority, two-way-state) summary carried in the MCS list
/// of a router hello, one per router adjacency the sender currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencySummary {
    /// The summarized neighbor's address.
    pub router_id: Address,
    /// That neighbor's advertised priority.
    pub priority: u8,
    /// Whether the sender has heard a hello from this neighbor listing the
    /// sender back (two-way communication established).
    pub two_way: bool,
}

const SUMMARY_LEN: usize = 3;

impl AdjacencySummary {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.router_id.to_wire().to_le_bytes());
        let state = self.priority | if self.two_way { 0x80 } else { 0x00 };
        buf.push(state);
    }

    fn decode(buf: &[u8], offset: usize) -> Result<Self, WireError> {
        let raw = read_u16(buf, offset)?;
        let router_id = Address::from_wire(raw).ok_or(WireError::FieldOutOfRange {
            field: "router_id",
            value: raw as i64,
        })?;
        require_len(buf, offset + SUMMARY_LEN)?;
        let state = buf[offset + 2];
        Ok(AdjacencySummary {
            router_id,
            priority: state & 0x7F,
            two_way: state & 0x80 != 0,
        })
    }
}

/// Periodic hello sent by every router on an Ethernet circuit to the All
/// Routers multicast address (C4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterHello {
    /// Sender's address.
    pub id: Address,
    /// Sender's routing level.
    pub node_type: NodeType,
    /// Maximum frame size the sender will accept.
    pub blksize: u16,
    /// Sender's designated-router election priority.
    pub priority: u8,
    /// Sender's area (redundant with `id.area()`, carried for parity with
    /// the original grammar).
    pub area: u8,
    /// Hello period the sender uses, in seconds.
    pub timer: u16,
    /// One summary per router adjacency the sender currently holds.
    pub neighbors: Vec<AdjacencySummary>,
}

const ROUTER_HELLO_HEADER_LEN: usize = 13;

impl RouterHello {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ROUTER_HELLO_HEADER_LEN + self.neighbors.len() * SUMMARY_LEN);
        buf.push(ControlFlags::RouterHello as u8);
        buf.push(VERSION.0);
        buf.push(VERSION.1);
        buf.push(VERSION.2);
        buf.extend_from_slice(&self.id.to_wire().to_le_bytes());
        buf.push(self.node_type.to_byte());
        buf.extend_from_slice(&self.blksize.to_le_bytes());
        buf.push(self.priority);
        buf.push(self.area);
        buf.extend_from_slice(&self.timer.to_le_bytes());
        for n in &self.neighbors {
            n.encode(&mut buf);
        }
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, ROUTER_HELLO_HEADER_LEN)?;
        if (buf[1], buf[2], buf[3]) != VERSION {
            return Err(WireError::FieldOutOfRange {
                field: "version",
                value: buf[1] as i64,
            });
        }
        let raw_id = read_u16(buf, 4)?;
        let id = Address::from_wire(raw_id).ok_or(WireError::FieldOutOfRange {
            field: "id",
            value: raw_id as i64,
        })?;
        let node_type = NodeType::from_byte(buf[6])?;
        let blksize = read_u16(buf, 7)?;
        let priority = buf[9];
        let area = buf[10];
        let timer = read_u16(buf, 11)?;
        let mut neighbors = Vec::new();
        let mut offset = ROUTER_HELLO_HEADER_LEN;
        while offset + SUMMARY_LEN <= buf.len() {
            neighbors.push(AdjacencySummary::decode(buf, offset)?);
            offset += SUMMARY_LEN;
        }
        Ok(RouterHello {
            id,
            node_type,
            blksize,
            priority,
            area,
            timer,
            neighbors,
        })
    }
}

/// Periodic hello sent by an endnode, or by a designated router to the All
/// Endnodes multicast address (C4). Carries no adjacency list: endnodes do
/// not participate in designated-router election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndnodeHello {
    /// Sender's address.
    pub id: Address,
    /// Maximum frame size the sender will accept.
    pub blksize: u16,
    /// Sender's area.
    pub area: u8,
    /// Hello period the sender uses, in seconds.
    pub timer: u16,
}

const ENDNODE_HELLO_LEN: usize = 11;

impl EndnodeHello {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ENDNODE_HELLO_LEN);
        buf.push(ControlFlags::EndnodeHello as u8);
        buf.push(VERSION.0);
        buf.push(VERSION.1);
        buf.push(VERSION.2);
        buf.extend_from_slice(&self.id.to_wire().to_le_bytes());
        buf.extend_from_slice(&self.blksize.to_le_bytes());
        buf.push(self.area);
        buf.extend_from_slice(&self.timer.to_le_bytes());
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, ENDNODE_HELLO_LEN)?;
        if (buf[1], buf[2], buf[3]) != VERSION {
            return Err(WireError::FieldOutOfRange {
                field: "version",
                value: buf[1] as i64,
            });
        }
        let raw_id = read_u16(buf, 4)?;
        let id = Address::from_wire(raw_id).ok_or(WireError::FieldOutOfRange {
            field: "id",
            value: raw_id as i64,
        })?;
        let blksize = read_u16(buf, 6)?;
        let area = buf[8];
        let timer = read_u16(buf, 9)?;
        Ok(EndnodeHello {
            id,
            blksize,
            area,
            timer,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn router_hello_round_trip_with_neighbors() {
        let m = RouterHello {
            id: Address::new(1, 10).unwrap(),
            node_type: NodeType::Level1Router,
            blksize: 576,
            priority: 64,
            area: 1,
            timer: 10,
            neighbors: vec![AdjacencySummary {
                router_id: Address::new(1, 20).unwrap(),
                priority: 64,
                two_way: true,
            }],
        };
        let bytes = m.encode();
        assert_eq!(RouterHello::decode(&bytes).unwrap(), m);
    }

    #[test]
    fn router_hello_round_trip_empty() {
        let m = RouterHello {
            id: Address::new(1, 10).unwrap(),
            node_type: NodeType::Level2Router,
            blksize: 1498,
            priority: 32,
            area: 1,
            timer: 10,
            neighbors: vec![],
        };
        assert_eq!(RouterHello::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn endnode_hello_round_trip() {
        let m = EndnodeHello {
            id: Address::new(1, 30).unwrap(),
            blksize: 576,
            area: 1,
            timer: 10,
        };
        assert_eq!(EndnodeHello::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = EndnodeHello {
            id: Address::new(1, 30).unwrap(),
            blksize: 576,
            area: 1,
            timer: 10,
        }
        .encode();
        bytes[1] = 9;
        assert!(EndnodeHello::decode(&bytes).is_err());
    }
}
