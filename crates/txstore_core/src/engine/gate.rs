//! Ordered single-writer / multi-reader admission.

use crate::types::Access;
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::fmt;

/// A place in the gate's queue, issued at submission time.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    access: Access,
}

impl Ticket {
    /// Position in submission order.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Requested access.
    #[must_use]
    pub fn access(&self) -> Access {
        self.access
    }
}

#[derive(Debug, Default)]
struct GateState {
    next_seq: u64,
    /// Tickets issued and not yet released.
    outstanding: BTreeSet<u64>,
    /// The write tickets among `outstanding`.
    outstanding_writes: BTreeSet<u64>,
}

impl GateState {
    fn admissible(&self, ticket: &Ticket) -> bool {
        match ticket.access {
            Access::Read => self
                .outstanding_writes
                .first()
                .map_or(true, |&write| write > ticket.seq),
            Access::Write => self.outstanding.first() == Some(&ticket.seq),
        }
    }
}

/// Gate enforcing barrier semantics over submission order.
///
/// Tickets are issued in submission order by [`admit`](Self::admit).
/// [`enter`](Self::enter) blocks until:
/// - for a read, every earlier write has been released;
/// - for a write, every earlier ticket of either kind has been released.
///
/// Reads therefore overlap with reads, and each write runs alone between
/// everything submitted before it and everything submitted after it.
pub struct ConcurrencyGate {
    state: Mutex<GateState>,
    released: Condvar,
}

impl ConcurrencyGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            released: Condvar::new(),
        }
    }

    /// Issues the next ticket. Never blocks on other tickets.
    pub fn admit(&self, access: Access) -> Ticket {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.outstanding.insert(seq);
        if access.is_write() {
            state.outstanding_writes.insert(seq);
        }
        tracing::trace!(seq, ?access, "ticket admitted");
        Ticket { seq, access }
    }

    /// Blocks until `ticket` may run. The returned pass releases it on drop.
    pub fn enter(&self, ticket: Ticket) -> GatePass<'_> {
        let mut state = self.state.lock();
        while !state.admissible(&ticket) {
            self.released.wait(&mut state);
        }
        tracing::trace!(seq = ticket.seq, access = ?ticket.access, "ticket entered");
        GatePass { gate: self, ticket }
    }

    /// Releases a ticket that will never enter.
    pub fn abandon(&self, ticket: Ticket) {
        self.release(&ticket);
    }

    /// Number of tickets issued and not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding.len()
    }

    fn release(&self, ticket: &Ticket) {
        let mut state = self.state.lock();
        state.outstanding.remove(&ticket.seq);
        if ticket.access.is_write() {
            state.outstanding_writes.remove(&ticket.seq);
        }
        drop(state);
        self.released.notify_all();
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Proof that a ticket is inside the gate.
#[must_use = "the ticket is released as soon as the pass is dropped"]
pub struct GatePass<'a> {
    gate: &'a ConcurrencyGate,
    ticket: Ticket,
}

impl GatePass<'_> {
    /// The ticket this pass holds.
    #[must_use]
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.release(&self.ticket);
    }
}
