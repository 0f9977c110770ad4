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

//! Concrete [`route20_core::circuit::Datalink`] backends (§6, §9).
//!
//! Three kinds, one per `route20_core::config::CircuitConfigKind` variant:
//! [`ethernet_pcap`] (raw Ethernet via libpcap), [`ethernet_socket`]
//! (Ethernet framing carried over UDP, for testing without raw sockets or
//! root), and [`ddcmp_socket`] (DDCMP point-to-point over a TCP stream).

pub mod ddcmp_socket;
pub mod ethernet_pcap;
pub mod ethernet_socket;

pub use ddcmp_socket::DdcmpSocketDatalink;
pub use ethernet_pcap::EthernetPcapDatalink;
pub use ethernet_socket::EthernetSocketDatalink;

pub use route20_core::constants::{
    ALL_ENDNODES_MULTICAST as ALL_ENDNODES, ALL_L2_ROUTERS_MULTICAST as ALL_L2_ROUTERS,
    ALL_ROUTERS_MULTICAST as ALL_ROUTERS, DECNET_ETHERTYPE as ETHERTYPE_DECNET,
};

/// A Phase IV address mapped to its Ethernet hardware address, per DNA's
/// deterministic HIORD mapping: `AA-00-04-00-xx-yy` where `xx,yy` is the
/// little-endian 16-bit wire form of the address.
pub fn address_to_mac(addr: route20_core::address::Address) -> [u8; 6] {
    let wire = addr.to_wire().to_le_bytes();
    [0xAA, 0x00, 0x04, 0x00, wire[0], wire[1]]
}
