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

//! Error taxonomy for every layer of the routing engine.
//!
//! Each layer gets its own small `thiserror` enum so that a handler can match
//! on exactly the failures it can produce; [`RouterError`] aggregates all of
//! them with `#[from]` for code that just wants to propagate with `?`.

use crate::address::Address;
use thiserror::Error;

/// Errors from decoding or encoding a Phase IV wire message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The buffer was shorter than the message it claims to contain.
    #[error("truncated message: need at least {need} bytes, got {got}")]
    Truncated {
        /// Minimum length required to decode the message.
        need: usize,
        /// Actual length of the buffer that was offered.
        got: usize,
    },
    /// The control/flags byte did not identify a known message type.
    #[error("invalid control flags byte: {0:#04x}")]
    InvalidControlFlags(u8),
    /// A field was present but outside its legal range (e.g. hop count > Maxh+1).
    #[error("field {field} out of range: {value}")]
    FieldOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The value that was rejected.
        value: i64,
    },
}

/// Errors from the circuit abstraction (C2).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitError {
    /// The underlying datalink failed to open.
    #[error("circuit {0} failed to open")]
    OpenFailed(String),
    /// The underlying datalink failed to start.
    #[error("circuit {0} failed to start")]
    StartFailed(String),
    /// A write to the datalink failed; the circuit is taken down.
    #[error("circuit {0} write failed, circuit going down")]
    WriteFailed(String),
    /// A point-to-point circuit received a message it did not expect in its
    /// current handshake state.
    #[error("circuit {0} received unexpected message in state {1}")]
    UnexpectedMessage(String, &'static str),
    /// Circuit cost of zero was rejected at configuration load.
    #[error("circuit {0} configured with cost 0, which is not allowed")]
    ZeroCost(String),
}

/// Errors from the adjacency table (C3).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdjacencyError {
    /// The router or end-node pool for a broadcast circuit is full.
    #[error("adjacency capacity exceeded on circuit slot {circuit_slot} (routers: {is_router})")]
    CapacityExceeded {
        /// Slot of the circuit whose pool is full.
        circuit_slot: u16,
        /// Whether the rejected adjacency was a router (vs. end node).
        is_router: bool,
    },
    /// No adjacency exists for the given address on the given circuit.
    #[error("no adjacency for {address:?} on circuit slot {circuit_slot}")]
    NotFound {
        /// Address of the adjacency that was looked up.
        address: Address,
        /// Slot of the circuit it was expected on.
        circuit_slot: u16,
    },
}

/// Errors from the Level 1 / Level 2 routing databases (C5/C6) and the
/// decision process (C8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingDbError {
    /// A node or area number fell outside its architectural range.
    #[error("destination index {0} out of range")]
    IndexOutOfRange(u16),
    /// An output slot (circuit or adjacency index) fell outside its range.
    #[error("output index {0} out of range")]
    OutputIndexOutOfRange(u16),
}

/// Errors from the forwarding process (C10).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForwardingError {
    /// The packet was malformed and was dropped without any state change.
    #[error("malformed data packet")]
    Malformed,
    /// The packet's visit count exceeded Maxv; it was dropped to break a
    /// forwarding loop.
    #[error("visit count exceeded Maxv, packet dropped")]
    LoopDetected,
    /// The destination area is unreachable; the long-form packet was dropped.
    #[error("destination area {0} is unreachable")]
    AreaUnreachable(u8),
    /// The destination node is unreachable; the packet was dropped.
    #[error("destination node {0} is unreachable")]
    NodeUnreachable(u16),
}

/// Errors from loading or reloading the node/circuit configuration (A1).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("configuration is invalid: {0}")]
    Invalid(String),
    /// A circuit was configured with an out-of-range cost.
    #[error("circuit {0} has invalid cost {1}")]
    InvalidCircuitCost(String, i64),
    /// Two circuits were configured with the same name.
    #[error("duplicate circuit name: {0}")]
    DuplicateCircuitName(String),
    /// The node name exceeded `Maxl` characters.
    #[error("node name {0:?} exceeds the {1}-character limit")]
    NodeNameTooLong(String, usize),
}

/// Top-level error type aggregating every layer.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Error from the wire codecs.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    /// Error from a circuit.
    #[error("circuit error: {0}")]
    Circuit(#[from] CircuitError),
    /// Error from the adjacency table.
    #[error("adjacency error: {0}")]
    Adjacency(#[from] AdjacencyError),
    /// Error from a routing database.
    #[error("routing database error: {0}")]
    RoutingDb(#[from] RoutingDbError),
    /// Error from the forwarding process.
    #[error("forwarding error: {0}")]
    Forwarding(#[from] ForwardingError),
    /// Error from the configuration loader.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
