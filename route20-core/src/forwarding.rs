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

//! Forwarding process (C10): the data-packet fast path.

use crate::address::Address;
use crate::area_forwarding;
use crate::constants::MAXV;
use crate::error::ForwardingError;
use crate::l1_db::L1Database;
use crate::l2_db::L2Database;
use crate::route_table::Output;
use crate::wire::data::{LongDataPacket, ShortDataPacket};

/// What to do with a data packet once the forwarding process has decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The packet's destination is this node; hand it to NSP.
    DeliverLocally {
        /// Sender's address.
        from: Address,
        /// Opaque NSP payload.
        payload: Vec<u8>,
    },
    /// Forward on the given output, with the packet's visit count already
    /// incremented and ready to re-encode.
    Forward {
        /// Output to resend on.
        output: Output,
        /// Packet with `visits` incremented, ready for `Circuit::write_packet`.
        packet: ForwardedPacket,
    },
}

/// A packet ready to be re-encoded and handed to a circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardedPacket {
    /// Re-encode as [`ShortDataPacket`].
    Short(ShortDataPacket),
    /// Re-encode as [`LongDataPacket`].
    Long(LongDataPacket),
}

/// Process one received short-form data packet addressed within the local
/// area (§4.10).
pub fn forward_short(
    local: Address,
    l1: &L1Database,
    mut packet: ShortDataPacket,
) -> Result<Disposition, ForwardingError> {
    if packet.visits as u16 + 1 > MAXV as u16 {
        return Err(ForwardingError::LoopDetected);
    }
    packet.visits += 1;
    if packet.dstnode == local.node() {
        return Ok(Disposition::DeliverLocally {
            from: Address::new(local.area(), packet.srcnode).unwrap_or(local),
            payload: packet.payload,
        });
    }
    match l1.oa(packet.dstnode).filter(|_| l1.is_reachable(packet.dstnode)) {
        Some(output) => Ok(Disposition::Forward {
            output,
            packet: ForwardedPacket::Short(packet),
        }),
        None => Err(ForwardingError::NodeUnreachable(packet.dstnode)),
    }
}

/// Process one received long-form data packet, which may cross an area
/// boundary (§4.10, §4.7).
pub fn forward_long(
    local: Address,
    l1: &L1Database,
    l2: &L2Database,
    mut packet: LongDataPacket,
) -> Result<Disposition, ForwardingError> {
    if packet.visits as u16 + 1 > MAXV as u16 {
        return Err(ForwardingError::LoopDetected);
    }
    packet.visits += 1;
    if packet.dst == local {
        return Ok(Disposition::DeliverLocally {
            from: packet.src,
            payload: packet.payload,
        });
    }
    if packet.dst.area() != local.area() {
        return match area_forwarding::output_for_area(l2, packet.dst.area()) {
            Some(output) => Ok(Disposition::Forward {
                output,
                packet: ForwardedPacket::Long(packet),
            }),
            None => Err(ForwardingError::AreaUnreachable(packet.dst.area())),
        };
    }
    match l1
        .oa(packet.dst.node())
        .filter(|_| l1.is_reachable(packet.dst.node()))
    {
        Some(output) => Ok(Disposition::Forward {
            output,
            packet: ForwardedPacket::Long(packet),
        }),
        None => Err(ForwardingError::NodeUnreachable(packet.dst.node())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loop_elimination_drops_at_maxv() {
        let local = Address::new(1, 10).unwrap();
        let l1 = L1Database::new(10);
        let packet = ShortDataPacket {
            dstnode: 20,
            srcnode: 30,
            visits: MAXV,
            payload: vec![],
        };
        assert_eq!(
            forward_short(local, &l1, packet),
            Err(ForwardingError::LoopDetected)
        );
    }

    #[test]
    fn loop_elimination_does_not_overflow_at_u8_max_visits() {
        let local = Address::new(1, 10).unwrap();
        let l1 = L1Database::new(10);
        let packet = ShortDataPacket {
            dstnode: 20,
            srcnode: 30,
            visits: u8::MAX,
            payload: vec![],
        };
        assert_eq!(
            forward_short(local, &l1, packet),
            Err(ForwardingError::LoopDetected)
        );
    }

    #[test]
    fn delivers_locally_on_match() {
        let local = Address::new(1, 10).unwrap();
        let l1 = L1Database::new(10);
        let packet = ShortDataPacket {
            dstnode: 10,
            srcnode: 30,
            visits: 0,
            payload: vec![9],
        };
        match forward_short(local, &l1, packet).unwrap() {
            Disposition::DeliverLocally { payload, .. } => assert_eq!(payload, vec![9]),
            _ => panic!("expected local delivery"),
        }
    }

    #[test]
    fn drops_unreachable_destination() {
        let local = Address::new(1, 10).unwrap();
        let l1 = L1Database::new(10);
        let packet = ShortDataPacket {
            dstnode: 20,
            srcnode: 30,
            visits: 0,
            payload: vec![],
        };
        assert_eq!(
            forward_short(local, &l1, packet),
            Err(ForwardingError::NodeUnreachable(20))
        );
    }

    #[test]
    fn long_packet_dropped_for_unreachable_area() {
        let local = Address::new(1, 10).unwrap();
        let l1 = L1Database::new(10);
        let l2 = L2Database::new(1);
        let packet = LongDataPacket {
            dst: Address::new(3, 5).unwrap(),
            src: Address::new(1, 20).unwrap(),
            service_class: 0,
            protocol_type: 0,
            visits: 0,
            payload: vec![],
        };
        assert_eq!(
            forward_long(local, &l1, &l2, packet),
            Err(ForwardingError::AreaUnreachable(3))
        );
    }
}
