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

//! DECnet node addressing.

use std::fmt;

/// A DECnet Phase IV address: an (area, node) pair.
///
/// `area` ranges 1..=63 and `node` ranges 1..=1023; both are validated by
/// [`Address::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    area: u8,
    node: u16,
}

impl Address {
    /// Construct an address, returning `None` if either component is out of
    /// the architectural range (area 1..=63, node 1..=1023).
    pub fn new(area: u8, node: u16) -> Option<Self> {
        if (1..=crate::constants::NA).contains(&area)
            && (1..=crate::constants::NN).contains(&node)
        {
            Some(Self { area, node })
        } else {
            None
        }
    }

    /// Area component (1..=63).
    pub fn area(&self) -> u8 {
        self.area
    }

    /// Node component (1..=1023).
    pub fn node(&self) -> u16 {
        self.node
    }

    /// Encode as the 16-bit packed form used on the wire: bits 0-9 are node,
    /// bits 10-15 are area.
    pub fn to_wire(&self) -> u16 {
        (self.node & 0x03FF) | ((self.area as u16) << 10)
    }

    /// Decode the 16-bit packed wire form. Returns `None` if the resulting
    /// area or node is 0 (DECnet addresses are 1-based).
    pub fn from_wire(value: u16) -> Option<Self> {
        let node = value & 0x03FF;
        let area = (value >> 10) as u8;
        Self::new(area, node)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.area, self.node)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Address::new(0, 10).is_none());
        assert!(Address::new(64, 10).is_none());
        assert!(Address::new(1, 0).is_none());
        assert!(Address::new(1, 1024).is_none());
    }

    #[test]
    fn wire_round_trip() {
        let a = Address::new(12, 345).unwrap();
        assert_eq!(Address::from_wire(a.to_wire()), Some(a));
    }
}
