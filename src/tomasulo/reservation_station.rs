// reservation_station.rs
//
// Reservation-station pool: a bounded, program-ordered collection of
// in-flight instructions waiting for operands or a functional unit. The
// original source backs this with a singly linked list; a `VecDeque`
// gives the same O(1) push-at-tail / in-order-scan behavior without the
// allocation-per-entry overhead, and capacities here are small enough
// (≤4) that the choice of backing structure is otherwise immaterial.

use crate::trace::InstrTag;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct RsEntry {
    pub instr: InstrTag,
    pub ready: bool,
    pub has_fu: bool,
}

#[derive(Debug)]
pub struct ReservationStationPool {
    capacity: usize,
    entries: VecDeque<RsEntry>,
}

impl ReservationStationPool {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Appends a new entry at the tail, i.e. program order. Caller must
    /// check `is_full` first; this never evicts.
    pub fn push(&mut self, instr: InstrTag) {
        debug_assert!(!self.is_full(), "reservation station pool overflow");
        self.entries.push_back(RsEntry { instr, ready: false, has_fu: false });
    }

    /// Program-order iteration, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RsEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RsEntry> {
        self.entries.iter_mut()
    }

    /// Sets the `ready` flag on the most recently pushed entry. Dispatch
    /// calls this immediately after `push` to record whether the operands
    /// were already available at issue time.
    pub fn set_tail_ready(&mut self, ready: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.ready = ready;
        }
    }

    /// Removes the entry occupied by `instr`, if any. Used when an
    /// instruction completes execution and leaves its reservation station.
    pub fn remove(&mut self, instr: InstrTag) -> Option<RsEntry> {
        let pos = self.entries.iter().position(|e| e.instr == instr)?;
        self.entries.remove(pos)
    }

    pub fn contains(&self, instr: InstrTag) -> bool {
        self.entries.iter().any(|e| e.instr == instr)
    }
}
