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

//! Point-to-point initialization message.

use super::{read_u16, require_len, ControlFlags};
use crate::error::WireError;

/// Node type advertised in the `tiinfo` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Level 1 router.
    Level1Router,
    /// Level 2 router.
    Level2Router,
}

impl NodeType {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            NodeType::Level1Router => 0,
            NodeType::Level2Router => 1,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Result<Self, WireError> {
        match b {
            0 => Ok(NodeType::Level1Router),
            1 => Ok(NodeType::Level2Router),
            other => Err(WireError::FieldOutOfRange {
                field: "tiinfo",
                value: other as i64,
            }),
        }
    }
}

/// The first message exchanged on a point-to-point circuit (C4, Halted →
/// Initialized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialization {
    /// Sender's node number (area is implicit: both ends are in the same
    /// area for a point-to-point circuit's Level 1 handshake).
    pub srcnode: u16,
    /// Sender's routing level.
    pub node_type: NodeType,
    /// Maximum frame size the sender will accept.
    pub blksize: u16,
    /// Hello/listener timer the sender intends to use, in seconds.
    pub timer: u16,
}

impl Initialization {
    /// Encoded length in bytes.
    pub const LEN: usize = 8;

    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);
        buf.push(ControlFlags::Initialization as u8);
        buf.extend_from_slice(&self.srcnode.to_le_bytes());
        buf.push(self.node_type.to_byte());
        buf.extend_from_slice(&self.blksize.to_le_bytes());
        buf.extend_from_slice(&self.timer.to_le_bytes());
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, Self::LEN)?;
        let srcnode = read_u16(buf, 1)?;
        let node_type = NodeType::from_byte(buf[3])?;
        let blksize = read_u16(buf, 4)?;
        let timer = read_u16(buf, 6)?;
        Ok(Initialization {
            srcnode,
            node_type,
            blksize,
            timer,
        })
    }
}
