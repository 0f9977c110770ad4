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

//! Point-to-point verification message.

use super::{read_u16, require_len, ControlFlags};
use crate::error::WireError;

/// Sent after [`crate::wire::Initialization`] when verification is required
/// by the circuit's configuration (C4, Initialized → VerificationSent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Sender's node number.
    pub srcnode: u16,
    /// Verification function value. This implementation carries it opaquely;
    /// authentication of routing messages is a non-goal.
    pub fcnval: u16,
}

impl Verification {
    /// Encoded length in bytes.
    pub const LEN: usize = 5;

    /// Encode to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::LEN);
        buf.push(ControlFlags::Verification as u8);
        buf.extend_from_slice(&self.srcnode.to_le_bytes());
        buf.extend_from_slice(&self.fcnval.to_le_bytes());
        buf
    }

    /// Decode from wire bytes (control byte included).
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        require_len(buf, Self::LEN)?;
        let srcnode = read_u16(buf, 1)?;
        let fcnval = read_u16(buf, 3)?;
        Ok(Verification { srcnode, fcnval })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let m = Verification {
            srcnode: 20,
            fcnval: 0,
        };
        assert_eq!(Verification::decode(&m.encode()).unwrap(), m);
    }
}
