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

//! Data packet formats carried through the forwarding process (C10).

use super::{read_u16, require_len, ControlFlags};
use crate::address::Address;
use crate::constants::MAX_DATA_MESSAGE_BODY_SIZE;
use crate::error::WireError;

/// Short-form data packet: used when source and destination are both
/// ordinary nodes with no NSP service-class negotiation in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortDataPacket {
    /// Destination node number (area is implicit: same area as the router
    /// that is forwarding a short-form packet).
    pub dstnode: u16,
    /// Source node number.
    pub srcnode: u16,
    /// Visit counter, incremented on every hop; the packet is dropped once
    /// it exceeds [`crate::constants::MAXV`].
    pub visits: u8,
    /// Opaque NSP payload.
    pub payload: Vec<u8>,
}

const SHORT_HEADER_LEN: usize = 6;

impl ShortDataPacket {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SHORT_HEADER_LEN + self.payload.len());
        buf.push(ControlFlags::ShortData as u8);
        buf.extend_from_slice(&self.dstnode.to_le_bytes());
        buf.extend_from_slice(&self.srcnode.to_le_bytes());
        buf.push(self.visits);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, SHORT_HEADER_LEN)?;
        let dstnode = read_u16(buf, 1)?;
        let srcnode = read_u16(buf, 3)?;
        let visits = buf[5];
        let payload = buf[SHORT_HEADER_LEN..].to_vec();
        if payload.len() > MAX_DATA_MESSAGE_BODY_SIZE {
            return Err(WireError::FieldOutOfRange {
                field: "payload",
                value: payload.len() as i64,
            });
        }
        Ok(ShortDataPacket {
            dstnode,
            srcnode,
            visits,
            payload,
        })
    }
}

/// Long-form data packet: carries full (area, node) addresses on both ends
/// plus the NSP service-class/protocol-type fields, used whenever source or
/// destination is in another area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongDataPacket {
    /// Full destination address.
    pub dst: Address,
    /// Full source address.
    pub src: Address,
    /// NSP service class, carried opaquely (NSP itself is out of scope).
    pub service_class: u8,
    /// NSP protocol type, carried opaquely.
    pub protocol_type: u8,
    /// Visit counter, incremented on every hop.
    pub visits: u8,
    /// Opaque NSP payload.
    pub payload: Vec<u8>,
}

const LONG_HEADER_LEN: usize = 8;

impl LongDataPacket {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(LONG_HEADER_LEN + self.payload.len());
        buf.push(ControlFlags::LongData as u8);
        buf.extend_from_slice(&self.dst.to_wire().to_le_bytes());
        buf.extend_from_slice(&self.src.to_wire().to_le_bytes());
        buf.push(self.service_class);
        buf.push(self.protocol_type);
        buf.push(self.visits);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, LONG_HEADER_LEN)?;
        let raw_dst = read_u16(buf, 1)?;
        let raw_src = read_u16(buf, 3)?;
        let dst = Address::from_wire(raw_dst).ok_or(WireError::FieldOutOfRange {
            field: "dst",
            value: raw_dst as i64,
        })?;
        let src = Address::from_wire(raw_src).ok_or(WireError::FieldOutOfRange {
            field: "src",
            value: raw_src as i64,
        })?;
        let service_class = buf[5];
        let protocol_type = buf[6];
        let visits = buf[7];
        let payload = buf[LONG_HEADER_LEN..].to_vec();
        if payload.len() > MAX_DATA_MESSAGE_BODY_SIZE {
            return Err(WireError::FieldOutOfRange {
                field: "payload",
                value: payload.len() as i64,
            });
        }
        Ok(LongDataPacket {
            dst,
            src,
            service_class,
            protocol_type,
            visits,
            payload,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_round_trip() {
        let m = ShortDataPacket {
            dstnode: 20,
            srcnode: 10,
            visits: 1,
            payload: vec![1, 2, 3],
        };
        assert_eq!(ShortDataPacket::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn long_round_trip() {
        let m = LongDataPacket {
            dst: Address::new(2, 20).unwrap(),
            src: Address::new(1, 10).unwrap(),
            service_class: 0,
            protocol_type: 0,
            visits: 1,
            payload: vec![1, 2, 3, 4],
        };
        assert_eq!(LongDataPacket::decode(&m.encode()).unwrap(), m);
    }

    #[test]
    fn empty_payload_round_trip() {
        let m = ShortDataPacket {
            dstnode: 20,
            srcnode: 10,
            visits: 0,
            payload: vec![],
        };
        assert_eq!(ShortDataPacket::decode(&m.encode()).unwrap(), m);
    }
}
