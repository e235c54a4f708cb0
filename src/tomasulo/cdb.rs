// cdb.rs
//
// The Common Data Bus slot: at most one instruction broadcasts per cycle.
// The broadcast cycle itself lives on the instruction's `cdb_cycle` field;
// this wrapper only tracks who currently holds the bus.

use crate::trace::InstrTag;

#[derive(Default, Debug)]
pub struct CdbSlot {
    occupant: Option<InstrTag>,
}

impl CdbSlot {
    pub fn new() -> Self {
        Self { occupant: None }
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn occupant(&self) -> Option<InstrTag> {
        self.occupant
    }

    pub fn claim(&mut self, instr: InstrTag) {
        self.occupant = Some(instr);
    }

    pub fn clear(&mut self) {
        self.occupant = None;
    }
}
