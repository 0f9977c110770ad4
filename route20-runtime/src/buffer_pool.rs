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

//! The VAXELN bounded-FIFO-plus-semaphore bridge (§5, §9 "Platform shims"),
//! kept here as the documented template for the one non-cooperative
//! concurrency boundary this crate's design allows: a backend whose OS API
//! delivers frames from a callback instead of a synchronous read.
//!
//! None of the three backends in [`crate::datalink`] actually need it —
//! pcap, UDP, and TCP are all synchronously readable from the loop thread —
//! so this module is exercised only by its own tests. A future callback-
//! driven backend (e.g. a vendor capture library with its own receive
//! thread) would push filled buffers into the [`BufferPool`]'s channel and
//! the loop thread would drain it alongside its `mio::Poll` wait.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

/// Original port-buffer count (`NUM_PORT_BUFFERS` in `vaxeln.c`).
pub const NUM_PORT_BUFFERS: usize = 4;
/// Original socket-buffer count (`NUM_SOCK_BUFFERS` in `vaxeln.c`).
pub const NUM_SOCK_BUFFERS: usize = 4;
/// Original fixed packet buffer length (`PACKET_BUFFER_LEN` in `vaxeln.c`).
pub const PACKET_BUFFER_LEN: usize = 1600;

/// A bounded channel of pre-allocated buffers, standing in for the VAXELN
/// semaphore-guarded FIFO: a producer (an OS callback, on a real
/// callback-driven backend) pushes filled buffers; the loop thread drains
/// them and returns each to [`BufferPool::free`] once its handler runs.
pub struct BufferPool {
    filled_tx: SyncSender<Vec<u8>>,
    filled_rx: Receiver<Vec<u8>>,
    free: Vec<Vec<u8>>,
    buffer_len: usize,
}

impl BufferPool {
    /// Construct a pool of `capacity` buffers, each `buffer_len` bytes,
    /// sized for hello-range drops with no production code path (`capacity:
    /// 4, buffer_len: 1600` replicates `vaxeln.c`'s port-buffer pool
    /// exactly).
    pub fn new(capacity: usize, buffer_len: usize) -> Self {
        let (filled_tx, filled_rx) = sync_channel(capacity);
        let free = (0..capacity).map(|_| vec![0u8; buffer_len]).collect();
        BufferPool {
            filled_tx,
            filled_rx,
            free,
            buffer_len,
        }
    }

    /// Take a free buffer from the pool, or `None` if the pool is
    /// exhausted (the original drops the packet in this case rather than
    /// growing the pool).
    pub fn take_free(&mut self) -> Option<Vec<u8>> {
        self.free.pop()
    }

    /// Return a buffer to the free pool after its handler has run.
    pub fn give_back(&mut self, mut buffer: Vec<u8>) {
        buffer.clear();
        buffer.resize(self.buffer_len, 0);
        self.free.push(buffer);
    }

    /// A clonable handle a producer (an OS callback thread) uses to push a
    /// filled buffer onto the FIFO. Non-blocking: if the FIFO is full the
    /// frame is dropped, matching "no retry on datalink write/read
    /// failure" (§9, Open Questions).
    pub fn producer(&self) -> SyncSender<Vec<u8>> {
        self.filled_tx.clone()
    }

    /// Drain every filled buffer currently queued, without blocking.
    pub fn drain_filled(&mut self) -> Vec<Vec<u8>> {
        self.filled_rx.try_iter().collect()
    }

    /// Push a filled buffer directly (used by tests in lieu of a real
    /// callback thread). Returns `false` if the FIFO was full and the
    /// buffer was dropped.
    pub fn push_filled(&self, buffer: Vec<u8>) -> bool {
        match self.filled_tx.try_send(buffer) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn free_pool_starts_full() {
        let mut pool = BufferPool::new(NUM_PORT_BUFFERS, PACKET_BUFFER_LEN);
        for _ in 0..NUM_PORT_BUFFERS {
            assert!(pool.take_free().is_some());
        }
        assert!(pool.take_free().is_none());
    }

    #[test]
    fn give_back_replenishes_free_pool() {
        let mut pool = BufferPool::new(1, 16);
        let buf = pool.take_free().unwrap();
        assert!(pool.take_free().is_none());
        pool.give_back(buf);
        assert!(pool.take_free().is_some());
    }

    #[test]
    fn fifo_drops_when_full_instead_of_blocking() {
        let pool = BufferPool::new(1, 16);
        assert!(pool.push_filled(vec![1, 2, 3]));
        assert!(!pool.push_filled(vec![4, 5, 6]));
    }

    #[test]
    fn drain_returns_everything_queued() {
        let mut pool = BufferPool::new(2, 16);
        pool.push_filled(vec![1]);
        pool.push_filled(vec![2]);
        let drained = pool.drain_filled();
        assert_eq!(drained, vec![vec![1], vec![2]]);
    }
}
