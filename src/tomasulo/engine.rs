// engine.rs
//
// The cycle-by-cycle Tomasulo pipeline engine: a clock-driven loop over
// five stage handlers invoked in reverse pipeline order every cycle. This
// is deliberately a flat sequence of explicit calls rather than a
// generalized scheduler — the reverse-order invocation is what keeps an
// instruction from advancing more than one stage per cycle, and that
// property only holds for this exact call order.

use crate::errors::TomasuloError;
use crate::tomasulo::cdb::CdbSlot;
use crate::tomasulo::config::{CdbArbitration, TomasuloConfig};
use crate::tomasulo::functional_unit::FunctionalUnitPool;
use crate::tomasulo::map_table::MapTable;
use crate::tomasulo::queue::InstructionQueue;
use crate::tomasulo::reservation_station::ReservationStationPool;
use crate::trace::{Instruction, InstrTag, OpcodeOracle, TraceChunk, DNA};
use log::{debug, trace};

/// Flattens a trace-chunk chain into a single owned vector, preserving
/// program order. The engine becomes the sole owner of these records —
/// every other table in the engine holds only `InstrTag` indices into it.
pub fn flatten_trace(chain: TraceChunk) -> Result<Vec<Instruction>, TomasuloError> {
    let mut out = Vec::new();
    let mut current = Some(Box::new(chain));
    let mut chunk_index = 0;
    while let Some(chunk) = current {
        if chunk.table.is_empty() {
            return Err(TomasuloError::EmptyChunk { chunk_index });
        }
        out.extend(chunk.table.iter().copied());
        current = chunk.next;
        chunk_index += 1;
    }
    Ok(out)
}

#[derive(Debug)]
pub struct TomasuloEngine {
    config: TomasuloConfig,
    trace: Vec<Instruction>,
    cursor: usize,
    fetch_done: bool,
    queue: InstructionQueue,
    rs_int: ReservationStationPool,
    rs_fp: ReservationStationPool,
    fu_int: FunctionalUnitPool,
    fu_fp: FunctionalUnitPool,
    cdb: CdbSlot,
    map_table: MapTable,
    cycle: u64,
}

impl TomasuloEngine {
    pub fn new(chain: TraceChunk, config: TomasuloConfig) -> Result<Self, TomasuloError> {
        let trace = flatten_trace(chain)?;
        for instr in &trace {
            for &r in instr.r_in.iter().chain(instr.r_out.iter()) {
                if r != DNA && (r as u16) >= config.total_regs {
                    return Err(TomasuloError::RegisterOutOfRange { reg: r, total_regs: config.total_regs });
                }
            }
        }
        Ok(Self {
            queue: InstructionQueue::new(config.ifq_size),
            rs_int: ReservationStationPool::new(config.rs_int),
            rs_fp: ReservationStationPool::new(config.rs_fp),
            fu_int: FunctionalUnitPool::new(config.fu_int),
            fu_fp: FunctionalUnitPool::new(config.fu_fp),
            map_table: MapTable::new(config.total_regs),
            cdb: CdbSlot::new(),
            cursor: 0,
            fetch_done: false,
            cycle: 0,
            trace,
            config,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.trace
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.trace
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Runs the engine to completion and returns the total cycle count.
    pub fn run<O: OpcodeOracle>(&mut self, oracle: &O) -> Result<u64, TomasuloError> {
        if self.cycle == 0 {
            self.cycle = 1;
        }
        loop {
            if self.step(oracle)? {
                break;
            }
        }
        Ok(self.cycle)
    }

    /// Advances the simulation by exactly one cycle, invoking the five
    /// stage handlers in reverse pipeline order. Returns `true` once the
    /// simulation has drained (trace exhausted, both reservation-station
    /// pools empty) — the caller should stop calling `step` at that point.
    /// Callers that want per-cycle visibility (visualization, tracing
    /// tools) drive the engine through this instead of `run`.
    pub fn step<O: OpcodeOracle>(&mut self, oracle: &O) -> Result<bool, TomasuloError> {
        if self.cycle == 0 {
            self.cycle = 1;
        }

        self.cdb_to_retire();
        self.execute_to_cdb(oracle)?;
        self.issue_to_execute()?;
        self.dispatch_to_issue(oracle)?;
        self.fetch_to_dispatch(oracle);

        self.cycle += 1;

        if let Some(max_cycles) = self.config.max_cycles {
            if self.cycle > max_cycles {
                debug!("watchdog tripped at cycle {}", self.cycle);
                return Err(TomasuloError::WatchdogExceeded { max_cycles });
            }
        }

        Ok(self.is_done())
    }

    fn is_done(&self) -> bool {
        self.fetch_done && self.queue.is_empty() && self.rs_int.is_empty() && self.rs_fp.is_empty()
    }

    pub fn rs_int_len(&self) -> usize {
        self.rs_int.len()
    }

    pub fn rs_fp_len(&self) -> usize {
        self.rs_fp.len()
    }

    pub fn cdb_occupant(&self) -> Option<InstrTag> {
        self.cdb.occupant()
    }

    pub fn fu_int_occupants(&self) -> impl Iterator<Item = (usize, InstrTag)> + '_ {
        self.fu_int.occupants()
    }

    pub fn fu_fp_occupants(&self) -> impl Iterator<Item = (usize, InstrTag)> + '_ {
        self.fu_fp.occupants()
    }

    // --- Stage 1: CDB -> Retire --------------------------------------

    fn cdb_to_retire(&mut self) {
        let Some(tag) = self.cdb.occupant() else { return };
        let cdb_cycle = self.trace[tag.0].cdb_cycle;
        if cdb_cycle == 0 || cdb_cycle >= self.cycle {
            return;
        }
        trace!("cycle {}: retiring {}", self.cycle, tag);

        let r_out = self.trace[tag.0].r_out;
        for r in r_out {
            if r != DNA {
                self.map_table.clear(r);
            }
        }
        Self::resolve_waiters(&mut self.rs_int, &mut self.trace, tag);
        Self::resolve_waiters(&mut self.rs_fp, &mut self.trace, tag);
        self.cdb.clear();
    }

    fn resolve_waiters(pool: &mut ReservationStationPool, trace: &mut [Instruction], tag: InstrTag) {
        for entry in pool.iter() {
            let instr = &mut trace[entry.instr.0];
            for q in instr.q.iter_mut() {
                if *q == Some(tag) {
                    *q = None;
                }
            }
        }
    }

    // --- Stage 2: Execute -> CDB ---------------------------------------

    fn execute_to_cdb<O: OpcodeOracle>(&mut self, oracle: &O) -> Result<(), TomasuloError> {
        self.complete_fu_class(oracle, true)?;
        self.complete_fu_class(oracle, false)?;
        Ok(())
    }

    fn complete_fu_class<O: OpcodeOracle>(&mut self, oracle: &O, is_int: bool) -> Result<(), TomasuloError> {
        let latency = if is_int { self.config.latency_int } else { self.config.latency_fp };
        let slot_count = if is_int { self.fu_int.len() } else { self.fu_fp.len() };

        for slot in 0..slot_count {
            let occupant = {
                let fu = if is_int { &self.fu_int } else { &self.fu_fp };
                fu.occupants().find(|&(s, _)| s == slot).map(|(_, t)| t)
            };
            let Some(tag) = occupant else { continue };

            let execute_cycle = self.trace[tag.0].execute_cycle;
            if execute_cycle == 0 || execute_cycle + latency > self.cycle {
                continue;
            }

            if self.config.cdb_arbitration == CdbArbitration::StallLoser
                && !self.cdb.is_free()
                && self.cdb.occupant() != Some(tag)
            {
                // keep the FU and RS entry held until the CDB frees up
                continue;
            }

            let pool = if is_int { &mut self.rs_int } else { &mut self.rs_fp };
            pool.remove(tag).ok_or(TomasuloError::OrphanFunctionalUnitOccupant { instr: tag.0 })?;

            if oracle.writes_cdb(self.trace[tag.0].opcode) {
                trace!("cycle {}: {} claims CDB", self.cycle, tag);
                self.cdb.claim(tag);
                self.trace[tag.0].cdb_cycle = self.cycle;
            }

            if is_int {
                self.fu_int.free(slot);
            } else {
                self.fu_fp.free(slot);
            }
        }
        Ok(())
    }

    // --- Stage 3: Issue -> Execute --------------------------------------

    fn issue_to_execute(&mut self) -> Result<(), TomasuloError> {
        Self::refresh_ready(&mut self.rs_int, &self.trace);
        Self::refresh_ready(&mut self.rs_fp, &self.trace);

        Self::advance_pool(&mut self.rs_int, &mut self.fu_int, &mut self.trace, self.cycle);
        Self::advance_pool(&mut self.rs_fp, &mut self.fu_fp, &mut self.trace, self.cycle);
        Ok(())
    }

    fn refresh_ready(pool: &mut ReservationStationPool, trace: &[Instruction]) {
        for entry in pool.iter_mut() {
            if !entry.ready {
                entry.ready = trace[entry.instr.0].q.iter().all(|q| q.is_none());
            }
        }
    }

    /// Walks the pool in program order; the first entry that cannot claim a
    /// functional unit stalls the rest of the pool for this cycle (older
    /// instructions never lose a functional-unit race to younger ones).
    fn advance_pool(
        pool: &mut ReservationStationPool,
        fu: &mut FunctionalUnitPool,
        trace: &mut [Instruction],
        cycle: u64,
    ) {
        for entry in pool.iter_mut() {
            if entry.has_fu || !entry.ready {
                continue;
            }
            let instr = &trace[entry.instr.0];
            if !(instr.issue_cycle != 0 && instr.issue_cycle < cycle && instr.execute_cycle == 0) {
                continue;
            }
            if !fu.claim(entry.instr) {
                break;
            }
            trace[entry.instr.0].execute_cycle = cycle;
            entry.has_fu = true;
        }
    }

    // --- Stage 4: Dispatch -> Issue --------------------------------------

    fn dispatch_to_issue<O: OpcodeOracle>(&mut self, oracle: &O) -> Result<(), TomasuloError> {
        let Some(head_tag) = self.queue.head() else { return Ok(()) };
        let head = self.trace[head_tag.0];
        if !(head.dispatch_cycle < self.cycle && head.issue_cycle == 0) {
            return Ok(());
        }

        let opcode = head.opcode;
        if oracle.is_cond_ctrl(opcode) || oracle.is_uncond_ctrl(opcode) {
            trace!("cycle {}: {} retires at dispatch (control transfer)", self.cycle, head_tag);
            self.queue.pop_head();
            return Ok(());
        }

        if !(oracle.uses_int_fu(opcode) || oracle.uses_fp_fu(opcode)) {
            // Neither control nor compute/load/store: nothing left to do
            // with it here (trap instructions never reach the queue).
            self.queue.pop_head();
            return Ok(());
        }

        let is_int = oracle.uses_int_fu(opcode);
        let pool = if is_int { &mut self.rs_int } else { &mut self.rs_fp };
        if pool.is_full() {
            return Ok(());
        }

        // Read producer tags from the map table before this instruction's
        // own r_out writes land, so self-referencing WAW doesn't corrupt Q.
        let mut q = [None; 3];
        for i in 0..3 {
            let r = head.r_in[i];
            if r != DNA {
                q[i] = self.map_table.get(r);
            }
        }
        let ready = q.iter().all(|x| x.is_none());

        pool.push(head_tag);
        pool.set_tail_ready(ready);

        {
            let instr = &mut self.trace[head_tag.0];
            instr.issue_cycle = self.cycle;
            instr.q = q;
        }

        for r in head.r_out {
            if r != DNA {
                self.map_table.set(r, head_tag);
            }
        }

        trace!("cycle {}: {} issues (ready={})", self.cycle, head_tag, ready);
        self.queue.pop_head();
        Ok(())
    }

    // --- Stage 5: Fetch -> Dispatch ---------------------------------------

    fn fetch_to_dispatch<O: OpcodeOracle>(&mut self, oracle: &O) {
        if self.fetch_done || self.queue.is_full() {
            return;
        }
        loop {
            if self.cursor >= self.trace.len() {
                self.fetch_done = true;
                return;
            }
            let idx = self.cursor;
            self.cursor += 1;
            if oracle.is_trap(self.trace[idx].opcode) {
                continue;
            }
            self.trace[idx].dispatch_cycle = self.cycle;
            self.queue.push_back(InstrTag(idx));
            if self.cursor >= self.trace.len() {
                self.fetch_done = true;
            }
            return;
        }
    }
}
