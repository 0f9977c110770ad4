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

//! The single-threaded cooperative event loop (A5, §5): multiplexes
//! datalink readiness, a stop signal, and the timer wheel with
//! `mio::Poll`, exactly the role `Main/Route20/linux.c`'s `MainLoop`/
//! `ProcessEvents` play in the original. Per §9 and the Open Questions in
//! §9 of `SPEC_FULL.md`, the interest set is rebuilt every iteration rather
//! than accumulated once, which is the fix for the Dev variant's missing
//! `FD_ZERO` re-zeroing.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use route20_core::node::{RouterAction, RouterState};

/// Receives payloads the forwarding process delivers locally (§6 NSP
/// up-call). NSP itself is out of scope; this crate only needs somewhere
/// to hand the payload.
pub trait NspSink {
    /// A data packet addressed to this node arrived; `payload` is the
    /// opaque NSP segment it carried.
    fn receive(&mut self, from: route20_core::address::Address, to: route20_core::address::Address, payload: &[u8]);
}

/// An [`NspSink`] that only logs, for binaries that don't implement NSP.
#[derive(Debug, Default)]
pub struct LoggingNspSink;

impl NspSink for LoggingNspSink {
    fn receive(&mut self, from: route20_core::address::Address, to: route20_core::address::Address, payload: &[u8]) {
        log::debug!("NSP <- {} -> {} ({} bytes)", from, to, payload.len());
    }
}

/// Current tick, seconds since the Unix epoch: what every `now` parameter
/// in `route20_core` expects.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The cooperative event loop tying a [`RouterState`] to real datalinks.
pub struct EventLoop<N: NspSink> {
    state: RouterState,
    poll: Poll,
    events: Events,
    nsp: N,
    stop: Arc<AtomicBool>,
}

impl<N: NspSink> EventLoop<N> {
    /// Construct a loop over `state`, whose circuits have already been
    /// opened and started (`RouterState::start_all_circuits`). Installs a
    /// SIGTERM handler as the stop signal (§5: "a dedicated stop event (or
    /// SIGTERM on Unix)").
    pub fn new(state: RouterState, nsp: N) -> io::Result<Self> {
        let poll = Poll::new()?;
        let stop = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
        Ok(EventLoop {
            state,
            poll,
            events: Events::with_capacity(64),
            nsp,
            stop,
        })
    }

    /// A handle the caller can use to request a clean shutdown from
    /// elsewhere (e.g. a management up-call), in addition to SIGTERM.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn registered_fds(&self) -> Vec<(u16, RawFd)> {
        self.state
            .circuits
            .values()
            .filter_map(|c| c.raw_fd().map(|fd| (c.slot, fd)))
            .collect()
    }

    fn rebuild_registrations(&mut self) -> io::Result<()> {
        for (slot, fd) in self.registered_fds() {
            let mut source = SourceFd(&fd);
            // Re-register every iteration (see module docs): a
            // `register` on an already-registered token fails, so
            // reregister, falling back to register for a fresh fd.
            if self
                .poll
                .registry()
                .reregister(&mut source, Token(slot as usize), Interest::READABLE)
                .is_err()
            {
                self.poll
                    .registry()
                    .register(&mut source, Token(slot as usize), Interest::READABLE)?;
            }
        }
        Ok(())
    }

    /// Carry out every action the core handed back: transmit on a
    /// circuit (taking it down on write failure, §4.12) or deliver to
    /// NSP. Public so a caller (e.g. `route20d`'s startup sequence) can
    /// dispatch actions produced before [`EventLoop::run`] starts.
    pub fn dispatch(&mut self, actions: Vec<RouterAction>) {
        for action in actions {
            match action {
                RouterAction::Transmit {
                    circuit_slot,
                    to,
                    packet,
                    is_hello,
                } => {
                    if let Some(circuit) = self.state.circuits.get_mut(&circuit_slot) {
                        if circuit.write_packet(to, &packet, is_hello).is_err() {
                            let down_actions = self.state.circuit_down(circuit_slot);
                            self.dispatch(down_actions);
                        }
                    }
                }
                RouterAction::DeliverToNsp { from, to, payload } => {
                    self.nsp.receive(from, to, &payload);
                }
            }
        }
    }

    /// Run until the stop signal fires. On exit, flushes shutdown hellos
    /// and closes every circuit in reverse slot order (§5).
    pub fn run(&mut self) -> io::Result<()> {
        while !self.stop.load(Ordering::Relaxed) {
            self.rebuild_registrations()?;
            let now = now_secs();
            let timeout = self
                .state
                .timers
                .seconds_until_next_due(now)
                .map(|s| Duration::from_secs(s.min(60)))
                .unwrap_or(Duration::from_secs(1));
            match self.poll.poll(&mut self.events, Some(timeout)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            let now = now_secs();
            for (_, purpose) in self.state.timers.fire_due(now) {
                let actions = self.state.handle_timer(purpose, now);
                self.dispatch(actions);
            }

            let ready_slots: Vec<u16> = self.events.iter().map(|ev| ev.token().0 as u16).collect();
            for slot in ready_slots {
                loop {
                    let frame = match self.state.circuits.get_mut(&slot) {
                        Some(circuit) => circuit.read_packet(),
                        None => break,
                    };
                    match frame {
                        Some(frame) => {
                            let actions = self.state.handle_frame(slot, &frame, now);
                            self.dispatch(actions);
                        }
                        None => break,
                    }
                }
            }

            let flushed = self.state.flush_pending_updates(now);
            self.dispatch(flushed);
        }

        log::info!("stop signalled, shutting down");
        let shutdown_actions = self.state.shutdown_hellos();
        self.dispatch(shutdown_actions);
        self.state.close_all_circuits();
        Ok(())
    }

    /// Consume the loop, returning the router state (for tests that want
    /// to inspect final database contents without a real signal).
    pub fn into_state(self) -> RouterState {
        self.state
    }
}
