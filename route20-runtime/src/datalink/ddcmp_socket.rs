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

//! DDCMP carried over a TCP stream (`kind = "ddcmp_socket"`), the
//! point-to-point backend. DDCMP is itself a framed byte-synchronous
//! protocol; since a TCP stream has no frame boundaries of its own, each
//! routing message is prefixed with its own little-endian `u16` length, the
//! minimal framing a stream transport needs and the same discipline DDCMP's
//! own message class header provides on a real serial line.

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;

use route20_core::address::Address;
use route20_core::circuit::Datalink;
use route20_core::constants::MAX_DATA_MESSAGE_BODY_SIZE;

/// DDCMP-over-TCP backend: connects outward to a peer's listening port.
pub struct DdcmpSocketDatalink {
    destination: (String, u16),
    stream: Option<TcpStream>,
    recv_buf: Vec<u8>,
}

impl fmt::Debug for DdcmpSocketDatalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdcmpSocketDatalink")
            .field("destination", &self.destination)
            .finish()
    }
}

impl DdcmpSocketDatalink {
    /// Construct a backend that connects to `host:port` on open.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        DdcmpSocketDatalink {
            destination: (host.into(), port),
            stream: None,
            recv_buf: Vec::new(),
        }
    }
}

impl Datalink for DdcmpSocketDatalink {
    fn open(&mut self) -> bool {
        let (host, port) = &self.destination;
        match TcpStream::connect((host.as_str(), *port)) {
            Ok(stream) => {
                if stream.set_nonblocking(true).is_err() {
                    return false;
                }
                self.stream = Some(stream);
                true
            }
            Err(e) => {
                log::error!("failed to connect DDCMP peer {}:{}: {}", host, port, e);
                false
            }
        }
    }

    fn start(&mut self) -> bool {
        self.stream.is_some()
    }

    fn read_packet(&mut self) -> Option<Vec<u8>> {
        let stream = self.stream.as_mut()?;
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => return None,
                Ok(n) => self.recv_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("DDCMP read error: {}", e);
                    return None;
                }
            }
        }
        if self.recv_buf.len() < 2 {
            return None;
        }
        let len = u16::from_le_bytes([self.recv_buf[0], self.recv_buf[1]]) as usize;
        if len > MAX_DATA_MESSAGE_BODY_SIZE || self.recv_buf.len() < 2 + len {
            return None;
        }
        let frame = self.recv_buf[2..2 + len].to_vec();
        self.recv_buf.drain(0..2 + len);
        Some(frame)
    }

    fn write_packet(&mut self, _to: Option<Address>, packet: &[u8], _is_hello: bool) -> bool {
        let stream = match &mut self.stream {
            Some(s) => s,
            None => return false,
        };
        let len = (packet.len() as u16).to_le_bytes();
        if stream.write_all(&len).is_err() || stream.write_all(packet).is_err() {
            return false;
        }
        true
    }

    fn close(&mut self) {
        self.stream = None;
        self.recv_buf.clear();
    }

    fn reject(&mut self) -> bool {
        self.close();
        true
    }

    fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        self.stream.as_ref().map(|s| s.as_raw_fd())
    }
}
