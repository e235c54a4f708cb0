// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// trace.rs
//
// Data model shared between the Tomasulo engine and whatever feeds it a
// linear instruction trace. Everything here is ISA-agnostic: opcodes are
// opaque integers and get classified through the `OpcodeOracle` trait
// rather than a concrete enum, so the engine never depends on a decoder.

use std::fmt;

/// Register identifier. `DNA` marks an absent operand slot.
pub type RegId = i16;

/// Sentinel for "no register here" (`DNA` in the original Tomasulo source).
pub const DNA: RegId = -1;

/// A stable handle to an instruction, used everywhere the original source
/// compared raw pointer identity (map table entries, `Q` tags, CDB slot,
/// functional-unit occupants). Indexes into the flattened trace the engine
/// builds out of a `TraceChunk` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrTag(pub usize);

impl fmt::Display for InstrTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse classification of an opcode, derived from the `OpcodeOracle`
/// flags. Used for readability in stage handlers and for diagnostics;
/// the flags themselves remain the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    UncondCtrl,
    CondCtrl,
    IntCompute,
    FpCompute,
    Load,
    Store,
    Trap,
}

/// Per-opcode predicate table, supplied externally (an ISA decoder's flag
/// table in the original source). The engine only ever asks these seven
/// questions about an opcode; it never interprets the opcode itself.
pub trait OpcodeOracle {
    fn is_uncond_ctrl(&self, opcode: u32) -> bool;
    fn is_cond_ctrl(&self, opcode: u32) -> bool;
    fn is_icomp(&self, opcode: u32) -> bool;
    fn is_fcomp(&self, opcode: u32) -> bool;
    fn is_load(&self, opcode: u32) -> bool;
    fn is_store(&self, opcode: u32) -> bool;
    fn is_trap(&self, opcode: u32) -> bool;

    /// Integer compute, load, or store: contends for an integer FU.
    fn uses_int_fu(&self, opcode: u32) -> bool {
        self.is_icomp(opcode) || self.is_load(opcode) || self.is_store(opcode)
    }

    /// Floating-point compute: contends for the FP FU.
    fn uses_fp_fu(&self, opcode: u32) -> bool {
        self.is_fcomp(opcode)
    }

    /// Integer compute, load, or floating compute: drives the CDB on
    /// completion. Stores do not write back.
    fn writes_cdb(&self, opcode: u32) -> bool {
        self.is_icomp(opcode) || self.is_load(opcode) || self.is_fcomp(opcode)
    }

    /// Best-effort single-label classification, for logging/visualization.
    /// Stage handlers should use the flag predicates directly, not this.
    fn classify(&self, opcode: u32) -> OpClass {
        if self.is_trap(opcode) {
            OpClass::Trap
        } else if self.is_uncond_ctrl(opcode) {
            OpClass::UncondCtrl
        } else if self.is_cond_ctrl(opcode) {
            OpClass::CondCtrl
        } else if self.is_load(opcode) {
            OpClass::Load
        } else if self.is_store(opcode) {
            OpClass::Store
        } else if self.is_fcomp(opcode) {
            OpClass::FpCompute
        } else {
            OpClass::IntCompute
        }
    }
}

/// A pre-decoded instruction record. The engine mutates only the four
/// timestamp fields and `q`; everything else is written once by whatever
/// built the trace.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    /// Opaque decoded opcode, meaningful only to an `OpcodeOracle`.
    pub opcode: u32,
    /// Program counter, carried through for diagnostics only.
    pub pc: u32,
    /// Program-order position of this instruction in the whole trace.
    pub index: usize,
    pub r_in: [RegId; 3],
    pub r_out: [RegId; 2],
    /// Producer tags: `Some(tag)` means "wait for `tag` to hit the CDB",
    /// `None` means the operand is already available.
    pub q: [Option<InstrTag>; 3],
    pub dispatch_cycle: u64,
    pub issue_cycle: u64,
    pub execute_cycle: u64,
    pub cdb_cycle: u64,
}

impl Instruction {
    pub fn new(opcode: u32, pc: u32, index: usize, r_in: [RegId; 3], r_out: [RegId; 2]) -> Self {
        Self {
            opcode,
            pc,
            index,
            r_in,
            r_out,
            q: [None; 3],
            dispatch_cycle: 0,
            issue_cycle: 0,
            execute_cycle: 0,
            cdb_cycle: 0,
        }
    }

    pub fn has_dispatched(&self) -> bool {
        self.dispatch_cycle != 0
    }

    pub fn has_issued(&self) -> bool {
        self.issue_cycle != 0
    }

    pub fn has_executed(&self) -> bool {
        self.execute_cycle != 0
    }

    pub fn has_retired(&self) -> bool {
        self.cdb_cycle != 0
    }
}

/// One segment of a linear instruction trace. Chunks chain via `next` so a
/// trace can be produced incrementally without holding the whole program in
/// one allocation; the engine flattens the chain once at construction time.
#[derive(Debug)]
pub struct TraceChunk {
    pub table: Vec<Instruction>,
    pub next: Option<Box<TraceChunk>>,
}

impl TraceChunk {
    pub fn new(table: Vec<Instruction>) -> Self {
        Self { table, next: None }
    }

    pub fn with_next(mut self, next: TraceChunk) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }
}
