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

//! Ethernet framing carried over UDP (`kind = "ethernet_socket"`): a
//! broadcast-capable backend that needs neither raw sockets nor root,
//! useful for running several simulated nodes on one host. There is no real
//! Ethernet multicast here; every peer configured with the same
//! `destination_host`/`destination_port` pair effectively shares one
//! "segment" and every datagram is delivered to all of them, which is close
//! enough to emulate a LAN for this crate's purposes.

use std::fmt;
use std::net::{SocketAddr, UdpSocket};

use route20_core::address::Address;
use route20_core::circuit::Datalink;

/// UDP-encapsulated Ethernet backend.
pub struct EthernetSocketDatalink {
    receive_port: u16,
    destination: SocketAddr,
    socket: Option<UdpSocket>,
}

impl fmt::Debug for EthernetSocketDatalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthernetSocketDatalink")
            .field("receive_port", &self.receive_port)
            .field("destination", &self.destination)
            .finish()
    }
}

impl EthernetSocketDatalink {
    /// Construct a backend that receives on `receive_port` and sends every
    /// frame (directed or broadcast alike, since this transport has no
    /// multicast concept) to `destination`.
    pub fn new(receive_port: u16, destination: SocketAddr) -> Self {
        EthernetSocketDatalink {
            receive_port,
            destination,
            socket: None,
        }
    }
}

impl Datalink for EthernetSocketDatalink {
    fn open(&mut self) -> bool {
        match UdpSocket::bind(("0.0.0.0", self.receive_port)) {
            Ok(socket) => {
                if socket.set_nonblocking(true).is_err() {
                    return false;
                }
                self.socket = Some(socket);
                true
            }
            Err(e) => {
                log::error!("failed to bind UDP port {}: {}", self.receive_port, e);
                false
            }
        }
    }

    fn start(&mut self) -> bool {
        self.socket.is_some()
    }

    fn read_packet(&mut self) -> Option<Vec<u8>> {
        let socket = self.socket.as_ref()?;
        let mut buf = [0u8; route20_core::constants::MAX_DATA_MESSAGE_BODY_SIZE];
        match socket.recv(&mut buf) {
            Ok(n) => Some(buf[..n].to_vec()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                log::warn!("UDP read error: {}", e);
                None
            }
        }
    }

    fn write_packet(&mut self, _to: Option<Address>, packet: &[u8], _is_hello: bool) -> bool {
        let socket = match &self.socket {
            Some(s) => s,
            None => return false,
        };
        match socket.send_to(packet, self.destination) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("UDP write error: {}", e);
                false
            }
        }
    }

    fn close(&mut self) {
        self.socket = None;
    }

    fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        self.socket.as_ref().map(|s| s.as_raw_fd())
    }
}
