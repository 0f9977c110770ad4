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

//! Phase IV routing message wire codecs (C1).
//!
//! Every message starts with a one-byte control/flags field identifying the
//! message type, followed by little-endian, unpadded fields. Each submodule
//! owns one message family; [`Message`] is the dispatch sum type produced by
//! [`decode`] from a raw circuit read.

pub mod data;
pub mod hello;
pub mod init;
pub mod routing_msg;
pub mod verification;

use crate::error::WireError;

pub use data::{LongDataPacket, ShortDataPacket};
pub use hello::{EndnodeHello, RouterHello};
pub use init::Initialization;
pub use routing_msg::RoutingMessage;
pub use verification::Verification;

/// Control byte values identifying each message type.
///
/// These values are an internal convention of this implementation rather
/// than a claim of interoperability with a real DECnet wire (out of scope
/// per the purpose statement); they only need to be self-consistent across
/// [`encode`]/[`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlFlags {
    /// Point-to-point initialization message.
    Initialization = 0x01,
    /// Point-to-point verification message.
    Verification = 0x02,
    /// Ethernet router hello.
    RouterHello = 0x03,
    /// Ethernet endnode hello.
    EndnodeHello = 0x04,
    /// Level 1 routing message.
    Level1Routing = 0x05,
    /// Level 2 routing message.
    Level2Routing = 0x06,
    /// Short-form data packet.
    ShortData = 0x07,
    /// Long-form data packet.
    LongData = 0x08,
}

impl ControlFlags {
    fn from_byte(b: u8) -> Result<Self, WireError> {
        Ok(match b {
            0x01 => ControlFlags::Initialization,
            0x02 => ControlFlags::Verification,
            0x03 => ControlFlags::RouterHello,
            0x04 => ControlFlags::EndnodeHello,
            0x05 => ControlFlags::Level1Routing,
            0x06 => ControlFlags::Level2Routing,
            0x07 => ControlFlags::ShortData,
            0x08 => ControlFlags::LongData,
            other => return Err(WireError::InvalidControlFlags(other)),
        })
    }
}

/// Any decoded Phase IV message, tagged by the type dispatched on its
/// control byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`Initialization`].
    Initialization(Initialization),
    /// See [`Verification`].
    Verification(Verification),
    /// See [`RouterHello`].
    RouterHello(RouterHello),
    /// See [`EndnodeHello`].
    EndnodeHello(EndnodeHello),
    /// Level 1 routing message. See [`RoutingMessage`].
    Level1Routing(RoutingMessage),
    /// Level 2 routing message. See [`RoutingMessage`].
    Level2Routing(RoutingMessage),
    /// See [`ShortDataPacket`].
    ShortData(ShortDataPacket),
    /// See [`LongDataPacket`].
    LongData(LongDataPacket),
}

/// Decode a message from a raw circuit read, dispatching on the control byte.
pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
    if buf.is_empty() {
        return Err(WireError::Truncated { need: 1, got: 0 });
    }
    match ControlFlags::from_byte(buf[0])? {
        ControlFlags::Initialization => Ok(Message::Initialization(Initialization::decode(buf)?)),
        ControlFlags::Verification => Ok(Message::Verification(Verification::decode(buf)?)),
        ControlFlags::RouterHello => Ok(Message::RouterHello(RouterHello::decode(buf)?)),
        ControlFlags::EndnodeHello => Ok(Message::EndnodeHello(EndnodeHello::decode(buf)?)),
        ControlFlags::Level1Routing => Ok(Message::Level1Routing(RoutingMessage::decode(buf)?)),
        ControlFlags::Level2Routing => Ok(Message::Level2Routing(RoutingMessage::decode(buf)?)),
        ControlFlags::ShortData => Ok(Message::ShortData(ShortDataPacket::decode(buf)?)),
        ControlFlags::LongData => Ok(Message::LongData(LongDataPacket::decode(buf)?)),
    }
}

/// Encode a message back into its wire form.
pub fn encode(msg: &Message) -> Vec<u8> {
    match msg {
        Message::Initialization(m) => m.encode(),
        Message::Verification(m) => m.encode(),
        Message::RouterHello(m) => m.encode(),
        Message::EndnodeHello(m) => m.encode(),
        Message::Level1Routing(m) => m.encode(ControlFlags::Level1Routing),
        Message::Level2Routing(m) => m.encode(ControlFlags::Level2Routing),
        Message::ShortData(m) => m.encode(),
        Message::LongData(m) => m.encode(),
    }
}

pub(crate) fn require_len(buf: &[u8], need: usize) -> Result<(), WireError> {
    if buf.len() < need {
        Err(WireError::Truncated {
            need,
            got: buf.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16, WireError> {
    require_len(buf, offset + 2)?;
    Ok(u16::from_le_bytes([buf[offset], buf[offset + 1]]))
}
