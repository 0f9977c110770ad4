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

//! # route20-runtime
//!
//! The platform side of `route20-core` (§6, §9 "Platform shims"): concrete
//! [`route20_core::circuit::Datalink`] backends for the three datalink kinds
//! named in the purpose statement (raw-Ethernet via [`pcap`], UDP-encapsulated
//! Ethernet, DDCMP-over-TCP), a buffer pool modeled after the VAXELN
//! callback-to-loop bridge (§5), and the `mio`-based single-threaded event
//! loop (A5) that multiplexes them with the timer wheel.
//!
//! None of this crate carries routing protocol logic; it only moves bytes
//! between an OS resource and `route20_core::node::RouterState`.

pub mod buffer_pool;
pub mod datalink;
pub mod event_loop;

pub use buffer_pool::BufferPool;
pub use event_loop::EventLoop;
