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

//! # Route20: DECnet Phase IV routing engine
//!
//! This crate implements the routing layer of the DNA (Digital Network
//! Architecture) Phase IV specification: neighbor discovery and designated
//! router election ([`init_layer`]), the Level 1 and Level 2 routing
//! databases and decision process ([`l1_db`], [`l2_db`], [`decision`]), the
//! update process that (re-)advertises reachability under split horizon with
//! poisoned reverse ([`update`]), and the forwarding process that moves data
//! packets between circuits ([`forwarding`]).
//!
//! ## Structure
//!
//! - [`wire`]: byte-exact encode/decode of the Phase IV message grammar.
//! - [`circuit`]: the uniform surface over Ethernet and point-to-point
//!   datalinks, independent of what is actually on the wire.
//! - [`adjacency`]: the per-circuit table of known neighbors.
//! - [`init_layer`]: hello emission, the point-to-point handshake, and
//!   designated router election on broadcast circuits.
//! - [`l1_db`] / [`l2_db`] / [`area_forwarding`]: the routing databases.
//! - [`decision`]: recomputes minima and chosen next hops on any input
//!   change.
//! - [`update`]: builds and segments routing messages per circuit.
//! - [`forwarding`]: the data-packet fast path.
//! - [`node`]: ties all of the above into a single [`node::RouterState`]
//!   threaded through every handler.
//! - [`timer`]: the timer wheel backing every periodic and one-shot timeout.
//! - [`config`]: the read-only configuration types loaded at startup.

pub mod address;
pub mod adjacency;
pub mod area_forwarding;
pub mod circuit;
pub mod config;
pub mod constants;
pub mod decision;
pub mod error;
pub mod forwarding;
pub mod init_layer;
pub mod l1_db;
pub mod l2_db;
pub mod node;
pub mod route_table;
pub mod timer;
pub mod update;
pub mod wire;

pub use address::Address;
pub use error::RouterError;
