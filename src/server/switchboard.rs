//! The passive port pool shared by all sessions of a server.

use super::session::TraceId;
use dashmap::{DashMap, Entry};
use std::{ops::RangeInclusive, sync::Arc};

/// Keeps track of the passive listening ports that sessions currently hold, so that a port is
/// never handed to two sessions at the same time.
#[derive(Debug)]
pub(crate) struct Switchboard {
    switchboard: DashMap<u16, TraceId>,
    port_range: RangeInclusive<u16>,
    logger: slog::Logger,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SwitchboardError {
    EntryNotAvailable,
    MaxRetriesError,
}

/// A claim on a passive port. The port goes back to the pool when the lease is dropped.
#[derive(Debug)]
pub(crate) struct PortLease {
    port: u16,
    board: Arc<Switchboard>,
}

impl PortLease {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        self.board.unregister(self.port);
    }
}

impl Switchboard {
    pub fn new(logger: slog::Logger, passive_ports: RangeInclusive<u16>) -> Self {
        Self {
            switchboard: DashMap::new(),
            port_range: passive_ports,
            logger,
        }
    }

    fn try_and_claim(&self, port: u16, owner: TraceId) -> Result<(), SwitchboardError> {
        // Atomically insert the port into the switchboard hashmap
        match self.switchboard.entry(port) {
            Entry::Occupied(_) => Err(SwitchboardError::EntryNotAvailable),
            Entry::Vacant(entry) => {
                entry.insert(owner);
                Ok(())
            }
        }
    }

    fn unregister(&self, port: u16) {
        if self.switchboard.remove(&port).is_none() {
            slog::warn!(self.logger, "Entry already removed? port: {}", port);
        }
    }

    /// The number of ports currently leased out.
    pub fn in_use(&self) -> usize {
        self.switchboard.len()
    }

    /// Find the next available port within the configured range (inclusive of the upper limit)
    /// and lease it to `owner`.
    ///
    /// The search starts at a random port and wraps around, so that concurrent sessions rarely
    /// compete for the same entry.
    pub fn reserve(self: &Arc<Self>, owner: TraceId) -> Result<PortLease, SwitchboardError> {
        let start = *self.port_range.start() as u32;
        let range_size = *self.port_range.end() as u32 - start + 1;

        let randomized_initial_offset = getrandom::u32().unwrap_or(0);

        for i in 0..range_size {
            let port = (start + (randomized_initial_offset.wrapping_add(i) % range_size)) as u16;
            match self.try_and_claim(port, owner) {
                Ok(()) => {
                    return Ok(PortLease {
                        port,
                        board: Arc::clone(self),
                    });
                }
                Err(_) => {
                    slog::debug!(self.logger, "Port {} is occupied, trying to find a vacant one", port);
                    continue;
                }
            }
        }

        slog::warn!(self.logger, "Out of tries reserving next free port!");
        Err(SwitchboardError::MaxRetriesError)
    }
}
