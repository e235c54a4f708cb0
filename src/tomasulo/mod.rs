//! Tomasulo out-of-order scheduling core: reservation stations, functional
//! units, a map table for register renaming, a single common data bus, and
//! the cycle-driven engine that ties them together.

pub mod cdb;
pub mod config;
pub mod engine;
pub mod functional_unit;
pub mod map_table;
pub mod queue;
pub mod reservation_station;

pub use config::{CdbArbitration, TomasuloConfig};
pub use engine::TomasuloEngine;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Instruction, OpClass, OpcodeOracle, TraceChunk, DNA};

    /// A tiny three-opcode ISA used only by these tests: ADD/SUB run on the
    /// integer FU and write the CDB, MULF runs on the FP FU and writes the
    /// CDB, BEQ is a control transfer that never reaches a reservation
    /// station.
    struct TinyIsa;

    const OP_ADD: u32 = 0;
    const OP_MULF: u32 = 1;
    const OP_BEQ: u32 = 2;

    impl OpcodeOracle for TinyIsa {
        fn is_uncond_ctrl(&self, _opcode: u32) -> bool {
            false
        }
        fn is_cond_ctrl(&self, opcode: u32) -> bool {
            opcode == OP_BEQ
        }
        fn is_icomp(&self, opcode: u32) -> bool {
            opcode == OP_ADD
        }
        fn is_fcomp(&self, opcode: u32) -> bool {
            opcode == OP_MULF
        }
        fn is_load(&self, _opcode: u32) -> bool {
            false
        }
        fn is_store(&self, _opcode: u32) -> bool {
            false
        }
        fn is_trap(&self, _opcode: u32) -> bool {
            false
        }
    }

    fn chunk(instrs: Vec<Instruction>) -> TraceChunk {
        TraceChunk::new(instrs)
    }

    fn config() -> TomasuloConfig {
        TomasuloConfig::new(32)
    }

    #[test]
    fn classify_matches_flag_predicates() {
        let oracle = TinyIsa;
        assert_eq!(oracle.classify(OP_ADD), OpClass::IntCompute);
        assert_eq!(oracle.classify(OP_MULF), OpClass::FpCompute);
        assert_eq!(oracle.classify(OP_BEQ), OpClass::CondCtrl);
    }

    #[test]
    fn single_independent_add_drains_through_all_stages() {
        let instr = Instruction::new(OP_ADD, 0x1000, 0, [DNA, DNA, DNA], [1, DNA]);
        let mut engine = TomasuloEngine::new(chunk(vec![instr]), config()).unwrap();
        let total_cycles = engine.run(&TinyIsa).unwrap();

        let result = &engine.instructions()[0];
        assert_eq!(result.dispatch_cycle, 1);
        assert_eq!(result.issue_cycle, 2);
        assert_eq!(result.execute_cycle, 3);
        assert_eq!(result.cdb_cycle, 3 + config().latency_int);
        assert!(total_cycles > result.cdb_cycle, "loop must run past the final broadcast to observe retirement");
    }

    #[test]
    fn raw_dependency_is_resolved_through_the_map_table() {
        // i0 writes r1; i1 reads r1 and r2. i1 must not become ready until
        // i0's broadcast has been retired.
        let i0 = Instruction::new(OP_ADD, 0x1000, 0, [DNA, DNA, DNA], [1, DNA]);
        let i1 = Instruction::new(OP_ADD, 0x1004, 1, [1, 2, DNA], [3, DNA]);
        let mut engine = TomasuloEngine::new(chunk(vec![i0, i1]), config()).unwrap();
        engine.run(&TinyIsa).unwrap();

        let trace = engine.instructions();
        assert!(trace[1].issue_cycle > trace[0].issue_cycle);
        // i1 cannot start executing before i0's producer tag clears, which
        // only happens the cycle after i0 broadcasts.
        assert!(trace[1].execute_cycle > trace[0].cdb_cycle);
    }

    #[test]
    fn waw_hazard_renames_to_the_younger_producer() {
        let i0 = Instruction::new(OP_ADD, 0x1000, 0, [DNA, DNA, DNA], [1, DNA]);
        let i1 = Instruction::new(OP_ADD, 0x1004, 1, [DNA, DNA, DNA], [1, DNA]);
        // i2 reads r1 and should end up waiting on i1 (the later producer),
        // never on i0.
        let i2 = Instruction::new(OP_ADD, 0x1008, 2, [1, DNA, DNA], [2, DNA]);
        let mut engine = TomasuloEngine::new(chunk(vec![i0, i1, i2]), config()).unwrap();
        engine.run(&TinyIsa).unwrap();

        let trace = engine.instructions();
        assert!(trace[2].execute_cycle > trace[1].cdb_cycle);
    }

    #[test]
    fn full_reservation_station_pool_stalls_dispatch() {
        let mut instrs = Vec::new();
        for i in 0..8 {
            instrs.push(Instruction::new(OP_ADD, 0x1000 + i as u32 * 4, i, [DNA, DNA, DNA], [DNA, DNA]));
        }
        let cfg = config().with_rs_sizes(2, 2).with_fu_counts(1, 1);
        let mut engine = TomasuloEngine::new(chunk(instrs), cfg).unwrap();
        engine.run(&TinyIsa).unwrap();

        let trace = engine.instructions();
        // with only one integer FU, the eight independent adds must
        // serialize through execute in program order.
        for window in trace.windows(2) {
            assert!(window[1].execute_cycle >= window[0].execute_cycle);
        }
    }

    #[test]
    fn control_transfer_skips_reservation_stations_entirely() {
        let beq = Instruction::new(OP_BEQ, 0x1000, 0, [1, 2, DNA], [DNA, DNA]);
        let add = Instruction::new(OP_ADD, 0x1004, 1, [DNA, DNA, DNA], [3, DNA]);
        let mut engine = TomasuloEngine::new(chunk(vec![beq, add]), config()).unwrap();
        engine.run(&TinyIsa).unwrap();

        let trace = engine.instructions();
        assert_eq!(trace[0].issue_cycle, 0, "control transfers never enter a reservation station");
        assert!(trace[1].issue_cycle > 0);
    }

    #[test]
    fn rejects_register_ids_outside_the_configured_file() {
        let bad = Instruction::new(OP_ADD, 0x1000, 0, [DNA, DNA, DNA], [99, DNA]);
        let err = TomasuloEngine::new(chunk(vec![bad]), TomasuloConfig::new(8)).unwrap_err();
        assert!(matches!(err, crate::errors::TomasuloError::RegisterOutOfRange { .. }));
    }

    #[test]
    fn rejects_empty_trace_chunks() {
        let err = TomasuloEngine::new(chunk(vec![]), config()).unwrap_err();
        assert!(matches!(err, crate::errors::TomasuloError::EmptyChunk { .. }));
    }

    #[test]
    fn chained_chunks_flatten_in_order() {
        let i0 = Instruction::new(OP_ADD, 0x1000, 0, [DNA, DNA, DNA], [1, DNA]);
        let i1 = Instruction::new(OP_ADD, 0x1004, 1, [DNA, DNA, DNA], [2, DNA]);
        let first = chunk(vec![i0]).with_next(chunk(vec![i1]));
        let engine = TomasuloEngine::new(first, config()).unwrap();
        assert_eq!(engine.instructions().len(), 2);
        assert_eq!(engine.instructions()[1].pc, 0x1004);
    }
}
