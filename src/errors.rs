use crate::trace::OpClass;
use std::error::Error;
use std::fmt;

/// Contract violations the core engine can detect. Ordinary stalls (full
/// reservation-station pool, no free functional unit, CDB already claimed
/// this cycle) are not errors and never produce one of these — they are
/// `Ok(())` no-ops in the stage handler. Everything here is a precondition
/// the caller (trace builder, oracle, or the engine itself) broke, and the
/// simulation aborts rather than limping on with undefined state.
#[derive(Debug)]
pub enum TomasuloError {
    RegisterOutOfRange { reg: i16, total_regs: u16 },
    EmptyChunk { chunk_index: usize },
    StaleProducerTag { instr: usize, stale_tag: usize },
    DuplicateReservationStationEntry { instr: usize },
    OrphanFunctionalUnitOccupant { instr: usize },
    ReservationStationPoolExhausted { class: OpClass },
    WatchdogExceeded { max_cycles: u64 },
}

impl fmt::Display for TomasuloError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TomasuloError::RegisterOutOfRange { reg, total_regs } => {
                write!(f, "register id {} outside [0, {})", reg, total_regs)
            },
            TomasuloError::EmptyChunk { chunk_index } => {
                write!(f, "trace chunk {} has zero instructions", chunk_index)
            },
            TomasuloError::StaleProducerTag { instr, stale_tag } => {
                write!(
                    f,
                    "instruction {} carries a producer tag {} that already retired",
                    instr, stale_tag
                )
            },
            TomasuloError::DuplicateReservationStationEntry { instr } => {
                write!(f, "instruction {} occupies more than one reservation station", instr)
            },
            TomasuloError::OrphanFunctionalUnitOccupant { instr } => {
                write!(
                    f,
                    "instruction {} holds a functional unit but has no reservation station entry",
                    instr
                )
            },
            TomasuloError::ReservationStationPoolExhausted { class } => {
                write!(f, "reservation station pool for {:?} exhausted", class)
            },
            TomasuloError::WatchdogExceeded { max_cycles } => {
                write!(f, "simulation exceeded the configured watchdog of {} cycles without draining", max_cycles)
            },
        }
    }
}

impl Error for TomasuloError {}
