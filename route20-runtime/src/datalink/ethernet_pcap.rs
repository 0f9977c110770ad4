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

//! Raw Ethernet via libpcap, the broadcast-capable backend for `[[circuit]]`
//! entries of `kind = "ethernet_pcap"`. Frames are captured and injected at
//! the Ethernet layer; this module owns the 14-byte header (destination,
//! source, ethertype) that the DNA Phase IV routing payload rides inside of.

use std::fmt;

use etherparse::Ethernet2Header;
use pcap::{Active, Capture, Device};

use route20_core::address::Address;
use route20_core::circuit::Datalink;

use super::{address_to_mac, ETHERTYPE_DECNET};

/// A BPF filter admitting only DECnet Phase IV frames, so the capture
/// doesn't hand every frame on the wire to the decoder.
fn decnet_filter() -> String {
    format!("ether proto {:#06x}", ETHERTYPE_DECNET)
}

enum State {
    /// Not yet opened.
    Closed,
    /// Opened (and, once `start` succeeds, live).
    Open {
        capture: Capture<Active>,
        local_mac: [u8; 6],
    },
}

/// Raw-Ethernet datalink backed by a libpcap capture handle.
pub struct EthernetPcapDatalink {
    interface: String,
    state: State,
    local_address: Address,
}

impl fmt::Debug for EthernetPcapDatalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthernetPcapDatalink").finish()
    }
}

impl EthernetPcapDatalink {
    /// Construct a backend bound to `interface`, not yet opened.
    pub fn new(interface: impl Into<String>, local_address: Address) -> Self {
        EthernetPcapDatalink {
            interface: interface.into(),
            state: State::Closed,
            local_address,
        }
    }

    fn open_capture(interface: &str) -> Result<Capture<Active>, pcap::Error> {
        let device = Device::list()?
            .into_iter()
            .find(|d| d.name == interface)
            .ok_or(pcap::Error::PcapError(format!(
                "no such interface: {}",
                interface
            )))?;
        let mut capture = Capture::from_device(device)?
            .promisc(true)
            .immediate_mode(true)
            .timeout(50)
            .open()?;
        capture.filter(&decnet_filter(), true)?;
        Ok(capture)
    }
}

impl Datalink for EthernetPcapDatalink {
    fn open(&mut self) -> bool {
        if matches!(self.state, State::Open { .. }) {
            return true;
        }
        match Self::open_capture(&self.interface) {
            Ok(capture) => {
                self.state = State::Open {
                    capture,
                    local_mac: address_to_mac(self.local_address),
                };
                true
            }
            Err(e) => {
                log::error!("failed to open pcap capture on {}: {}", self.interface, e);
                false
            }
        }
    }

    fn start(&mut self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    fn read_packet(&mut self) -> Option<Vec<u8>> {
        let capture = match &mut self.state {
            State::Open { capture, .. } => capture,
            State::Closed => return None,
        };
        match capture.next_packet() {
            Ok(packet) => match Ethernet2Header::from_slice(packet.data) {
                Ok((_header, payload)) => Some(payload.to_vec()),
                Err(_) => None,
            },
            Err(pcap::Error::TimeoutExpired) => None,
            Err(e) => {
                log::warn!("pcap read error: {}", e);
                None
            }
        }
    }

    fn write_packet(&mut self, to: Option<Address>, packet: &[u8], _is_hello: bool) -> bool {
        let (capture, local_mac) = match &mut self.state {
            State::Open { capture, local_mac } => (capture, *local_mac),
            State::Closed => return false,
        };
        let dest_mac = match to {
            Some(addr) => address_to_mac(addr),
            None => super::ALL_ROUTERS,
        };
        let header = Ethernet2Header {
            destination: dest_mac,
            source: local_mac,
            ether_type: ETHERTYPE_DECNET.into(),
        };
        let mut frame = Vec::with_capacity(14 + packet.len());
        frame.extend_from_slice(&header.to_bytes());
        frame.extend_from_slice(packet);
        match capture.sendpacket(frame) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("pcap write error: {}", e);
                false
            }
        }
    }

    fn close(&mut self) {
        self.state = State::Closed;
    }

    fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        match &self.state {
            State::Open { capture, .. } => Some(capture.as_raw_fd()),
            State::Closed => None,
        }
    }
}
